//! Endpoint pools with freshness bookkeeping.
//!
//! # Responsibilities
//! - Hold the set of endpoints serving one route, keyed by canonical address
//! - Track per-endpoint last-updated instants
//! - Evict entries that have outlived their staleness threshold
//!
//! # Design Decisions
//! - No clock inside the pool: "now" is always passed in by the registry,
//!   so staleness is testable without wall-clock waits
//! - No internal locking: every access happens under the registry lock
//! - Threshold resolution order: endpoint override, then the pool default,
//!   then the registry-wide default

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::route::endpoint::Endpoint;

#[derive(Debug, Clone)]
struct PoolEntry {
    endpoint: Endpoint,
    updated_at: Instant,
}

/// The endpoints serving one route's context path.
#[derive(Debug, Clone)]
pub struct Pool {
    entries: HashMap<String, PoolEntry>,
    context_path: String,
    stale_threshold: Option<Duration>,
}

impl Pool {
    pub fn new(stale_threshold: Option<Duration>, context_path: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            context_path: context_path.into(),
            stale_threshold,
        }
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    /// Insert or refresh an endpoint by canonical address.
    ///
    /// The entry's timestamp is always moved to `now`. Field updates
    /// carried by a message whose modification tag is older than the one
    /// already stored are discarded. Returns true when the address was not
    /// present before.
    pub fn put(&mut self, endpoint: Endpoint, now: Instant) -> bool {
        match self.entries.get_mut(endpoint.canonical_addr()) {
            Some(entry) => {
                if !entry.endpoint.modification_tag.succeeds(&endpoint.modification_tag) {
                    entry.endpoint = endpoint;
                }
                entry.updated_at = now;
                false
            }
            None => {
                self.entries.insert(
                    endpoint.canonical_addr().to_string(),
                    PoolEntry {
                        endpoint,
                        updated_at: now,
                    },
                );
                true
            }
        }
    }

    /// Delete by canonical address. A stale caller-held copy is a valid
    /// argument; only the address is consulted. Returns true if an entry
    /// was removed.
    pub fn remove(&mut self, endpoint: &Endpoint) -> bool {
        self.entries.remove(endpoint.canonical_addr()).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Apply `f` to every endpoint. Order is unspecified but stable for
    /// the duration of the call.
    pub fn each(&self, mut f: impl FnMut(&Endpoint)) {
        for entry in self.entries.values() {
            f(&entry.endpoint);
        }
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.entries.values().map(|e| &e.endpoint)
    }

    /// Remove every endpoint whose age at `now` exceeds its effective
    /// threshold, returning the removed set for reporting. Removing
    /// nothing is a valid outcome.
    pub fn prune_endpoints(&mut self, default_threshold: Duration, now: Instant) -> Vec<Endpoint> {
        let mut pruned = Vec::new();
        let pool_threshold = self.stale_threshold;
        self.entries.retain(|_, entry| {
            let threshold = entry
                .endpoint
                .stale_threshold
                .or(pool_threshold)
                .unwrap_or(default_threshold);
            let fresh = now.duration_since(entry.updated_at) <= threshold;
            if !fresh {
                pruned.push(entry.endpoint.clone());
            }
            fresh
        });
        pruned
    }

    /// Move every entry's timestamp to `now` without touching any other
    /// field. Custom per-endpoint thresholds survive.
    pub fn mark_updated(&mut self, now: Instant) {
        for entry in self.entries.values_mut() {
            entry.updated_at = now;
        }
    }
}
