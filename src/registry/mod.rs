//! Route registry subsystem.
//!
//! # Data Flow
//! ```text
//! mbus subscriber ──Register/Unregister──▶ RouteRegistry
//!                                              │ one RwLock
//!                                              ▼
//!                                        trie.rs (route key → pool)
//!
//! dispatch path ──Lookup──▶ exact match, then wildcard generalization
//! background task ──tick──▶ pruning sweep (suspendable via connectivity)
//! ```
//!
//! # Design Decisions
//! - One reader-writer lock at the registry boundary; the trie and pools
//!   carry no synchronization of their own, so the single-writer
//!   discipline is auditable in this file alone
//! - Lookups return cloned pool snapshots; callers never hold the lock
//! - The sweep asks a named ConnectivityObserver, not a bare closure, and
//!   bulk-refreshes timestamps on the first tick after an outage so a
//!   transport gap is not mistaken for fleet-wide staleness

pub mod clock;
pub mod connectivity;
pub mod trie;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::route::{Endpoint, Pool, RouteUri};

pub use clock::{Clock, ManualClock, SystemClock};
pub use connectivity::{AlwaysConnected, BusConnectivity, ConnectivityObserver};
pub use trie::Trie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PruneStatus {
    Connected,
    Disconnected,
}

#[derive(Debug)]
struct Inner {
    by_uri: Trie,
    pruning_status: PruneStatus,
    connectivity: Arc<dyn ConnectivityObserver>,
    time_of_last_update: Option<Instant>,
}

/// The routing table orchestrator: pools in a prefix trie under one lock,
/// kept fresh by registration traffic and swept by a background task.
#[derive(Debug)]
pub struct RouteRegistry {
    inner: RwLock<Inner>,
    prune_interval: Duration,
    stale_threshold: Duration,
    clock: Arc<dyn Clock>,
    pruning_cycle: Mutex<Option<Shutdown>>,
}

impl RouteRegistry {
    pub fn new(prune_interval: Duration, stale_threshold: Duration) -> Self {
        Self::with_clock(prune_interval, stale_threshold, Arc::new(SystemClock))
    }

    pub fn with_clock(
        prune_interval: Duration,
        stale_threshold: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: RwLock::new(Inner {
                by_uri: Trie::new(),
                pruning_status: PruneStatus::Connected,
                connectivity: Arc::new(AlwaysConnected),
                time_of_last_update: None,
            }),
            prune_interval,
            stale_threshold,
            clock,
            pruning_cycle: Mutex::new(None),
        }
    }

    /// Insert or refresh `endpoint` under `uri`, creating the pool lazily.
    ///
    /// The pool's context path comes from the raw URI and its default
    /// staleness threshold is a quarter of the registry-wide one.
    pub fn register(&self, uri: &RouteUri, endpoint: Endpoint) {
        let now = self.clock.now();
        let backend = endpoint.canonical_addr().to_string();
        let key = uri.route_key();

        let mut inner = self.write();
        let added = match inner.by_uri.find_mut(&key) {
            Some(pool) => pool.put(endpoint, now),
            None => {
                let mut pool = Pool::new(Some(self.stale_threshold / 4), uri.context_path());
                let added = pool.put(endpoint, now);
                inner.by_uri.insert(key, pool);
                added
            }
        };
        inner.time_of_last_update = Some(now);
        let (uris, endpoints) = (inner.by_uri.pool_count(), inner.by_uri.endpoint_count());
        drop(inner);

        metrics::record_route_registered(added);
        metrics::update_route_counts(uris, endpoints);
        tracing::debug!(uri = %uri, backend = %backend, added, "endpoint registered");
    }

    /// Remove `endpoint` from the pool at `uri`, deleting the pool (and
    /// the trie branch that held it) once empty. Unknown URIs and unknown
    /// endpoints are a no-op, never an error.
    pub fn unregister(&self, uri: &RouteUri, endpoint: &Endpoint) {
        let key = uri.route_key();

        let mut inner = self.write();
        let mut removed = false;
        if let Some(pool) = inner.by_uri.find_mut(&key) {
            removed = pool.remove(endpoint);
            if pool.is_empty() {
                inner.by_uri.delete(&key);
            }
        }
        let (uris, endpoints) = (inner.by_uri.pool_count(), inner.by_uri.endpoint_count());
        drop(inner);

        metrics::record_route_unregistered(removed);
        metrics::update_route_counts(uris, endpoints);
        tracing::debug!(
            uri = %uri,
            backend = %endpoint.canonical_addr(),
            removed,
            "endpoint unregistered"
        );
    }

    /// Most specific match wins: try the exact key, then walk the wildcard
    /// generalization chain until a non-empty pool is found or the chain
    /// is exhausted. Returns a snapshot of the pool.
    pub fn lookup(&self, uri: &RouteUri) -> Option<Pool> {
        let inner = self.read();
        let mut key = uri.route_key();
        loop {
            if let Some(pool) = inner.by_uri.match_uri(&key) {
                return Some(pool.clone());
            }
            key = key.next_wildcard()?;
        }
    }

    /// Instance-pinned lookup: the base pool filtered down to the one
    /// endpoint matching both application id and instance index, returned
    /// as a fresh single-entry pool.
    pub fn lookup_with_instance(
        &self,
        uri: &RouteUri,
        app_id: &str,
        app_index: &str,
    ) -> Option<Pool> {
        let pool = self.lookup(uri)?;
        let now = self.clock.now();

        let mut surgical = None;
        pool.each(|endpoint| {
            if endpoint.application_id == app_id && endpoint.private_instance_index == app_index {
                let mut single = Pool::new(None, "");
                single.put(endpoint.clone(), now);
                surgical = Some(single);
            }
        });
        surgical
    }

    /// Start the background sweep, one tick per configured interval. A
    /// non-positive interval disables pruning entirely; a second call
    /// while a cycle is running is a no-op.
    pub fn start_pruning_cycle(self: &Arc<Self>) {
        if self.prune_interval.is_zero() {
            tracing::info!("pruning cycle disabled: interval is zero");
            return;
        }

        let mut cycle = self.cycle_guard();
        if cycle.is_some() {
            return;
        }

        let shutdown = Shutdown::new();
        let mut stop = shutdown.subscribe();
        let registry = Arc::clone(self);
        let interval = self.prune_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // An interval's first tick is immediate; the first sweep
            // should wait one full period.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => registry.prune_stale_endpoints(),
                    _ = stop.recv() => {
                        tracing::debug!("pruning cycle stopped");
                        break;
                    }
                }
            }
        });

        tracing::info!(interval_secs = interval.as_secs(), "pruning cycle started");
        *cycle = Some(shutdown);
    }

    /// Cancel future ticks. A sweep already in flight finishes under the
    /// lock it holds.
    pub fn stop_pruning_cycle(&self) {
        if let Some(shutdown) = self.cycle_guard().take() {
            shutdown.trigger();
        }
    }

    /// Install the connectivity source consulted by the sweep. Until this
    /// is called the registry assumes the event source is reachable.
    pub fn suspend_pruning(&self, observer: Arc<dyn ConnectivityObserver>) {
        self.write().connectivity = observer;
    }

    /// Run one sweep immediately. Normally driven by the pruning cycle.
    ///
    /// While the event source is unreachable nothing is evicted: absence
    /// of registration traffic must not read as staleness. On the first
    /// connected tick after an outage every timestamp is refreshed before
    /// eviction so the fleet that silently aged during the gap survives.
    pub fn prune_stale_endpoints(&self) {
        let now = self.clock.now();
        let mut inner = self.write();

        if !inner.connectivity.is_connected() {
            if inner.pruning_status == PruneStatus::Connected {
                tracing::info!("event source unreachable; pruning suspended");
            }
            inner.pruning_status = PruneStatus::Disconnected;
            return;
        }
        if inner.pruning_status == PruneStatus::Disconnected {
            tracing::info!("event source reachable again; refreshing all endpoints");
            freshen_routes(&mut inner, now);
        }
        inner.pruning_status = PruneStatus::Connected;

        let threshold = self.stale_threshold;
        let mut pruned_total = 0;
        inner.by_uri.each_pool_mut(|key, pool| {
            let pruned = pool.prune_endpoints(threshold, now);
            if !pruned.is_empty() {
                pruned_total += pruned.len();
                let addresses: Vec<String> = pruned
                    .iter()
                    .map(|e| e.canonical_addr().to_string())
                    .collect();
                tracing::info!(uri = %key, ?addresses, "pruned stale endpoints");
            }
        });
        inner.by_uri.snip_empty();

        let (uris, endpoints) = (inner.by_uri.pool_count(), inner.by_uri.endpoint_count());
        drop(inner);

        if pruned_total > 0 {
            metrics::record_routes_pruned(pruned_total);
        }
        metrics::update_route_counts(uris, endpoints);
    }

    pub fn num_uris(&self) -> usize {
        self.read().by_uri.pool_count()
    }

    pub fn num_endpoints(&self) -> usize {
        self.read().by_uri.endpoint_count()
    }

    /// Instant of the last successful register, if any.
    pub fn time_of_last_update(&self) -> Option<Instant> {
        self.read().time_of_last_update
    }

    /// Export the full table as uri → endpoint descriptors, sorted for
    /// stable serialization.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<EndpointDescriptor>> {
        let inner = self.read();
        let mut table = BTreeMap::new();
        inner.by_uri.each_pool(|key, pool| {
            let mut descriptors: Vec<EndpointDescriptor> =
                pool.endpoints().map(EndpointDescriptor::from).collect();
            descriptors.sort_by(|a, b| a.address.cmp(&b.address));
            table.insert(key.to_string(), descriptors);
        });
        table
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("registry lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("registry lock poisoned")
    }

    fn cycle_guard(&self) -> std::sync::MutexGuard<'_, Option<Shutdown>> {
        self.pruning_cycle.lock().expect("pruning cycle mutex poisoned")
    }
}

fn freshen_routes(inner: &mut Inner, now: Instant) {
    inner.by_uri.each_pool_mut(|_, pool| pool.mark_updated(now));
}

/// One endpoint as exported by [`RouteRegistry::snapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct EndpointDescriptor {
    pub address: String,
    pub tags: HashMap<String, String>,
    pub app: String,
    pub private_instance_id: String,
    pub private_instance_index: String,
}

impl From<&Endpoint> for EndpointDescriptor {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            address: endpoint.canonical_addr().to_string(),
            tags: endpoint.tags.clone(),
            app: endpoint.application_id.clone(),
            private_instance_id: endpoint.private_instance_id.clone(),
            private_instance_index: endpoint.private_instance_index.clone(),
        }
    }
}
