//! Prefix trie routing table.
//!
//! # Responsibilities
//! - Map normalized route keys to endpoint pools
//! - Support exact lookup, deletion with ancestor pruning, and full
//!   traversal for the pruning sweep and snapshot export
//!
//! # Design Decisions
//! - Owned recursive nodes (each node exclusively owns its children);
//!   route churn is control-plane-rate, so no arena is needed
//! - Keys are segmented in reverse-domain order, so routes under one
//!   domain share a branch and dead branches stay cheap to excise
//! - Pool-bearing nodes remember the key they were inserted under, so
//!   exports never reconstruct URIs from trie paths
//! - No locking here: every access happens under the registry lock

use std::collections::HashMap;

use crate::route::{Pool, RouteKey};

#[derive(Debug, Default)]
struct Node {
    children: HashMap<String, Node>,
    entry: Option<RouteEntry>,
}

#[derive(Debug)]
struct RouteEntry {
    key: RouteKey,
    pool: Pool,
}

/// The routing table: one pool per distinct route key.
#[derive(Debug, Default)]
pub struct Trie {
    root: Node,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `pool` at the node for `key`, creating intermediate nodes as
    /// needed. Overwrites any pool already present at that node.
    pub fn insert(&mut self, key: RouteKey, pool: Pool) {
        let mut node = &mut self.root;
        let segments: Vec<String> = key.segments().map(str::to_string).collect();
        for segment in segments {
            node = node.children.entry(segment).or_default();
        }
        node.entry = Some(RouteEntry { key, pool });
    }

    /// Exact-path lookup, used by registration to find an existing pool.
    /// Empty pools are returned too so re-registration reuses them.
    pub fn find(&self, key: &RouteKey) -> Option<&Pool> {
        self.node(key).and_then(|n| n.entry.as_ref()).map(|e| &e.pool)
    }

    pub fn find_mut(&mut self, key: &RouteKey) -> Option<&mut Pool> {
        let mut node = &mut self.root;
        for segment in key.segments() {
            node = node.children.get_mut(segment)?;
        }
        node.entry.as_mut().map(|e| &mut e.pool)
    }

    /// Exact structural match for the dispatch path. A key bearing `*`
    /// matches only a node inserted with that exact wildcard; the caller
    /// drives generalization by retrying with progressively wider keys.
    /// An empty pool counts as a miss.
    pub fn match_uri(&self, key: &RouteKey) -> Option<&Pool> {
        self.find(key).filter(|pool| !pool.is_empty())
    }

    /// Remove the pool at `key` and excise ancestors left with no pool and
    /// no children. Returns true if a pool was removed.
    pub fn delete(&mut self, key: &RouteKey) -> bool {
        let segments: Vec<&str> = key.segments().collect();
        Self::delete_at(&mut self.root, &segments)
    }

    fn delete_at(node: &mut Node, segments: &[&str]) -> bool {
        match segments.split_first() {
            None => node.entry.take().is_some(),
            Some((head, rest)) => {
                let Some(child) = node.children.get_mut(*head) else {
                    return false;
                };
                let removed = Self::delete_at(child, rest);
                if child.entry.is_none() && child.children.is_empty() {
                    node.children.remove(*head);
                }
                removed
            }
        }
    }

    /// Visit every pool in the table. Used by the pruning sweep and the
    /// post-reconnect bulk refresh.
    pub fn each_pool_mut(&mut self, mut f: impl FnMut(&RouteKey, &mut Pool)) {
        Self::each_mut_at(&mut self.root, &mut f);
    }

    fn each_mut_at(node: &mut Node, f: &mut impl FnMut(&RouteKey, &mut Pool)) {
        if let Some(entry) = node.entry.as_mut() {
            f(&entry.key, &mut entry.pool);
        }
        for child in node.children.values_mut() {
            Self::each_mut_at(child, f);
        }
    }

    /// Drop every empty pool and detach every node left without a pool or
    /// children, walking bottom-up. Run after each pruning sweep so the
    /// tree never accumulates dead branches.
    pub fn snip_empty(&mut self) {
        Self::snip_at(&mut self.root);
    }

    fn snip_at(node: &mut Node) {
        if node.entry.as_ref().is_some_and(|e| e.pool.is_empty()) {
            node.entry = None;
        }
        node.children.retain(|_, child| {
            Self::snip_at(child);
            child.entry.is_some() || !child.children.is_empty()
        });
    }

    pub fn pool_count(&self) -> usize {
        let mut count = 0;
        self.each_pool(|_, _| count += 1);
        count
    }

    pub fn endpoint_count(&self) -> usize {
        let mut count = 0;
        self.each_pool(|_, pool| count += pool.len());
        count
    }

    pub fn each_pool(&self, mut f: impl FnMut(&RouteKey, &Pool)) {
        Self::each_at(&self.root, &mut f);
    }

    fn each_at(node: &Node, f: &mut impl FnMut(&RouteKey, &Pool)) {
        if let Some(entry) = node.entry.as_ref() {
            f(&entry.key, &entry.pool);
        }
        for child in node.children.values() {
            Self::each_at(child, f);
        }
    }

    fn node(&self, key: &RouteKey) -> Option<&Node> {
        let mut node = &self.root;
        for segment in key.segments() {
            node = node.children.get(segment)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Instant;

    use super::*;
    use crate::route::{Endpoint, ModificationTag};

    fn key(raw: &str) -> RouteKey {
        RouteKey::parse(raw)
    }

    fn pool_with(addrs: &[(&str, u16)]) -> Pool {
        let mut pool = Pool::new(None, "/");
        let now = Instant::now();
        for (host, port) in addrs {
            let e = Endpoint::new(
                "app1",
                *host,
                *port,
                "",
                "",
                HashMap::new(),
                None,
                "",
                ModificationTag::new(),
            );
            pool.put(e, now);
        }
        pool
    }

    #[test]
    fn test_insert_and_find() {
        let mut trie = Trie::new();
        trie.insert(key("foo.example.com"), pool_with(&[("10.0.0.1", 1)]));

        assert!(trie.find(&key("foo.example.com")).is_some());
        assert!(trie.find(&key("bar.example.com")).is_none());
        // A pure prefix of an inserted key holds no pool.
        assert!(trie.find(&key("example.com")).is_none());
    }

    #[test]
    fn test_match_uri_is_exact_and_skips_empty_pools() {
        let mut trie = Trie::new();
        trie.insert(key("*.example.com"), pool_with(&[("10.0.0.1", 1)]));
        trie.insert(key("empty.example.com"), pool_with(&[]));

        // No generalization inside the trie itself.
        assert!(trie.match_uri(&key("foo.example.com")).is_none());
        assert!(trie.match_uri(&key("*.example.com")).is_some());

        assert!(trie.match_uri(&key("empty.example.com")).is_none());
        assert!(trie.find(&key("empty.example.com")).is_some());
    }

    #[test]
    fn test_delete_prunes_dead_ancestors() {
        let mut trie = Trie::new();
        trie.insert(key("a.b.example.com"), pool_with(&[("10.0.0.1", 1)]));
        trie.insert(key("c.example.com"), pool_with(&[("10.0.0.2", 1)]));

        assert!(trie.delete(&key("a.b.example.com")));
        assert!(trie.find(&key("a.b.example.com")).is_none());
        // The sibling route under the shared branch is untouched.
        assert!(trie.find(&key("c.example.com")).is_some());
        assert_eq!(trie.pool_count(), 1);

        assert!(!trie.delete(&key("a.b.example.com")));
    }

    #[test]
    fn test_delete_keeps_nodes_needed_by_descendants() {
        let mut trie = Trie::new();
        trie.insert(key("example.com"), pool_with(&[("10.0.0.1", 1)]));
        trie.insert(key("foo.example.com"), pool_with(&[("10.0.0.2", 1)]));

        assert!(trie.delete(&key("example.com")));
        assert!(trie.find(&key("foo.example.com")).is_some());
    }

    #[test]
    fn test_snip_empty_removes_emptied_pools() {
        let mut trie = Trie::new();
        trie.insert(key("foo.example.com"), pool_with(&[]));
        trie.insert(key("bar.example.com"), pool_with(&[("10.0.0.1", 1)]));
        assert_eq!(trie.pool_count(), 2);

        trie.snip_empty();
        assert_eq!(trie.pool_count(), 1);
        assert!(trie.find(&key("foo.example.com")).is_none());
        assert!(trie.find(&key("bar.example.com")).is_some());
    }

    #[test]
    fn test_counts() {
        let mut trie = Trie::new();
        trie.insert(
            key("foo.example.com"),
            pool_with(&[("10.0.0.1", 1), ("10.0.0.2", 1)]),
        );
        trie.insert(key("bar.example.com"), pool_with(&[("10.0.0.3", 1)]));

        assert_eq!(trie.pool_count(), 2);
        assert_eq!(trie.endpoint_count(), 3);
    }

    #[test]
    fn test_each_pool_mut_visits_every_pool() {
        let mut trie = Trie::new();
        trie.insert(key("foo.example.com"), pool_with(&[("10.0.0.1", 1)]));
        trie.insert(key("bar.example.com/api"), pool_with(&[("10.0.0.2", 1)]));

        let mut seen = Vec::new();
        trie.each_pool_mut(|key, _| seen.push(key.to_string()));
        seen.sort();
        assert_eq!(seen, vec!["bar.example.com/api", "foo.example.com"]);
    }
}
