//! Route URI normalization and wildcard generalization.
//!
//! # Responsibilities
//! - Normalize raw registration URIs into canonical trie keys
//! - Produce the wildcard generalization chain for lookup fallback
//! - Derive the context path attached to a pool at creation
//!
//! # Design Decisions
//! - Host labels are lowercased (host matching is case-insensitive per
//!   HTTP); path segments keep their case
//! - Query strings are stripped at `?` on both registration and lookup,
//!   so both sides agree on one key space
//! - `*` is an ordinary label in the key; generalization is driven by the
//!   caller repeatedly asking for the next wildcard form

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw route URI as carried on the wire, e.g. `foo.example.com/api`.
///
/// Kept unmodified so the context path can be derived from the original
/// spelling; all matching goes through [`RouteUri::route_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteUri(String);

impl RouteUri {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize into the canonical trie key.
    pub fn route_key(&self) -> RouteKey {
        RouteKey::parse(&self.0)
    }

    /// The `/`-prefixed path portion of the raw URI, query stripped.
    ///
    /// This is what a pool records as its context path, taken from the
    /// original spelling rather than the normalized key.
    pub fn context_path(&self) -> String {
        let raw = self.0.trim();
        let raw = raw.split('?').next().unwrap_or("");
        match raw.find('/') {
            Some(idx) => raw[idx..].to_string(),
            None => "/".to_string(),
        }
    }
}

impl fmt::Display for RouteUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteUri {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A normalized route key: lowercased host labels plus path segments.
///
/// Trie segmentation is reverse-domain order (`foo.example.com/v1` walks
/// `com`, `example`, `foo`, `v1`) so routes under one domain share a
/// branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    host: Vec<String>,
    path: Vec<String>,
}

/// The label that stands in for "any subdomain" at its position.
pub const WILDCARD_LABEL: &str = "*";

impl RouteKey {
    /// Parse and normalize a raw URI: strip the query, lowercase the host,
    /// drop empty segments and any trailing slash.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let raw = raw.split('?').next().unwrap_or("");

        let (host_part, path_part) = match raw.find('/') {
            Some(idx) => (&raw[..idx], &raw[idx + 1..]),
            None => (raw, ""),
        };

        let host = host_part
            .split('.')
            .filter(|label| !label.is_empty())
            .map(|label| label.to_ascii_lowercase())
            .collect();

        let path = path_part
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(str::to_string)
            .collect();

        Self { host, path }
    }

    /// The next more-general wildcard form: the left-most host label is
    /// replaced by `*`, with an existing leading `*` consumed first.
    ///
    /// Returns `None` once fewer than two labels would remain, which
    /// terminates the lookup fallback chain.
    pub fn next_wildcard(&self) -> Option<RouteKey> {
        let mut host = self.host.clone();
        if host.first().map(String::as_str) == Some(WILDCARD_LABEL) {
            host.remove(0);
        }
        if host.len() < 2 {
            return None;
        }
        host[0] = WILDCARD_LABEL.to_string();
        Some(RouteKey {
            host,
            path: self.path.clone(),
        })
    }

    /// Trie segments in insertion/match order: reversed host labels, then
    /// path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.host
            .iter()
            .rev()
            .chain(self.path.iter())
            .map(String::as_str)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host.join("."))?;
        for seg in &self.path {
            write!(f, "/{}", seg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key_normalization() {
        let key = RouteKey::parse("Foo.Example.COM/API/v1?color=blue");
        assert_eq!(key.to_string(), "foo.example.com/API/v1");

        // Trailing slash and empty segments collapse to the same key.
        assert_eq!(RouteKey::parse("foo.example.com/"), RouteKey::parse("foo.example.com"));
        assert_eq!(RouteKey::parse("foo.example.com//a"), RouteKey::parse("foo.example.com/a"));
    }

    #[test]
    fn test_register_and_lookup_agree() {
        let registered = RouteUri::new("Foo.Example.com").route_key();
        let looked_up = RouteUri::new("foo.example.com?q=1").route_key();
        assert_eq!(registered, looked_up);
    }

    #[test]
    fn test_wildcard_chain() {
        let key = RouteKey::parse("foo.bar.example.com");

        let w1 = key.next_wildcard().unwrap();
        assert_eq!(w1.to_string(), "*.bar.example.com");

        let w2 = w1.next_wildcard().unwrap();
        assert_eq!(w2.to_string(), "*.example.com");

        let w3 = w2.next_wildcard().unwrap();
        assert_eq!(w3.to_string(), "*.com");

        assert!(w3.next_wildcard().is_none());
    }

    #[test]
    fn test_wildcard_exhaustion_on_single_label() {
        assert!(RouteKey::parse("localhost").next_wildcard().is_none());
        assert!(RouteKey::parse("*").next_wildcard().is_none());
    }

    #[test]
    fn test_wildcard_preserves_path() {
        let key = RouteKey::parse("foo.example.com/api");
        let w = key.next_wildcard().unwrap();
        assert_eq!(w.to_string(), "*.example.com/api");
    }

    #[test]
    fn test_segments_are_reverse_domain_order() {
        let key = RouteKey::parse("foo.example.com/v1");
        let segs: Vec<_> = key.segments().collect();
        assert_eq!(segs, vec!["com", "example", "foo", "v1"]);
    }

    #[test]
    fn test_context_path() {
        assert_eq!(RouteUri::new("foo.example.com").context_path(), "/");
        assert_eq!(RouteUri::new("foo.example.com/app").context_path(), "/app");
        assert_eq!(RouteUri::new("foo.example.com/app/x?q=1").context_path(), "/app/x");
    }
}
