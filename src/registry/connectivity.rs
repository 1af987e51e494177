//! Transport connectivity as a named capability.
//!
//! The pruning sweep must not mistake a silent message bus for a fleet of
//! stale backends. Instead of a bare closure, the registry asks an
//! injected observer once per tick; the transport layer owns the answer.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Answers "is the registration event source currently reachable?".
///
/// Queried under the registry write lock once per pruning tick; it must be
/// cheap, non-blocking, and must never call back into the registry.
pub trait ConnectivityObserver: Send + Sync + fmt::Debug {
    fn is_connected(&self) -> bool;
}

/// Default observer: pruning is never suspended.
#[derive(Debug, Default)]
pub struct AlwaysConnected;

impl ConnectivityObserver for AlwaysConnected {
    fn is_connected(&self) -> bool {
        true
    }
}

/// A shared flag flipped by the transport layer as its connection comes
/// and goes.
#[derive(Debug)]
pub struct BusConnectivity {
    connected: AtomicBool,
}

impl BusConnectivity {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }
}

impl Default for BusConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityObserver for BusConnectivity {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_connectivity_flag() {
        let conn = BusConnectivity::new();
        assert!(conn.is_connected());

        conn.set_connected(false);
        assert!(!conn.is_connected());

        conn.set_connected(true);
        assert!(conn.is_connected());
    }
}
