//! Backend endpoint identity and metadata.
//!
//! # Responsibilities
//! - Represent one registered backend instance
//! - Derive the canonical `host:port` address used as its identity key
//! - Carry the modification tag used to reject out-of-date updates

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

/// A monotonically comparable tag attached to each registration.
///
/// Two tags are comparable only when they share a guid; within one guid a
/// larger index denotes a later revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModificationTag {
    pub guid: String,
    pub index: u64,
}

impl ModificationTag {
    pub fn new() -> Self {
        Self {
            guid: Uuid::new_v4().to_string(),
            index: 0,
        }
    }

    pub fn increment(&mut self) {
        self.index += 1;
    }

    /// True when `self` is a strictly later revision of the same tag line.
    pub fn succeeds(&self, other: &ModificationTag) -> bool {
        self.guid == other.guid && self.index > other.index
    }
}

impl Default for ModificationTag {
    fn default() -> Self {
        Self::new()
    }
}

/// One backend instance as registered over the message bus.
///
/// Identity for pool membership is the canonical address only; every other
/// field is mutable metadata refreshed on re-registration.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub application_id: String,
    host: String,
    port: u16,
    canonical_addr: String,
    pub private_instance_id: String,
    pub private_instance_index: String,
    pub tags: HashMap<String, String>,
    /// Per-endpoint staleness override; the pool default applies when unset.
    pub stale_threshold: Option<Duration>,
    pub route_service_url: String,
    pub modification_tag: ModificationTag,
}

impl Endpoint {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        application_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        private_instance_id: impl Into<String>,
        private_instance_index: impl Into<String>,
        tags: HashMap<String, String>,
        stale_threshold: Option<Duration>,
        route_service_url: impl Into<String>,
        modification_tag: ModificationTag,
    ) -> Self {
        let host = host.into();
        let canonical_addr = format!("{}:{}", host, port);
        Self {
            application_id: application_id.into(),
            host,
            port,
            canonical_addr,
            private_instance_id: private_instance_id.into(),
            private_instance_index: private_instance_index.into(),
            tags,
            stale_threshold,
            route_service_url: route_service_url.into(),
            modification_tag,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The `host:port` identity key, computed once at construction.
    pub fn canonical_addr(&self) -> &str {
        &self.canonical_addr
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_addr == other.canonical_addr
    }
}

impl Eq for Endpoint {}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(host: &str, port: u16, app: &str) -> Endpoint {
        Endpoint::new(
            app,
            host,
            port,
            "",
            "",
            HashMap::new(),
            None,
            "",
            ModificationTag::new(),
        )
    }

    #[test]
    fn test_canonical_addr() {
        let e = endpoint("10.0.0.1", 6060, "app1");
        assert_eq!(e.canonical_addr(), "10.0.0.1:6060");
    }

    #[test]
    fn test_equality_is_by_address_only() {
        let a = endpoint("10.0.0.1", 6060, "app1");
        let b = endpoint("10.0.0.1", 6060, "completely-different-app");
        let c = endpoint("10.0.0.1", 6061, "app1");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_modification_tag_succeeds() {
        let mut newer = ModificationTag::new();
        let older = newer.clone();
        newer.increment();

        assert!(newer.succeeds(&older));
        assert!(!older.succeeds(&newer));
        assert!(!older.succeeds(&older));

        // Different guid lines are never comparable.
        let unrelated = ModificationTag::new();
        assert!(!newer.succeeds(&unrelated));
    }
}
