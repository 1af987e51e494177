//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every section has defaults so a minimal (or empty) config runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mbus::PendingLimits;

/// Root configuration for the route registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Pruning sweep timing.
    pub pruning: PruningConfig,

    /// Message bus flow control.
    pub mbus: MbusConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Timing for the staleness sweep.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PruningConfig {
    /// Seconds between sweeps. Zero disables pruning.
    pub interval_secs: u64,

    /// Registry-wide staleness threshold in seconds. Pools default to a
    /// quarter of this; endpoints may carry their own override.
    pub stale_threshold_secs: u64,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            stale_threshold_secs: 120,
        }
    }
}

impl PruningConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_threshold_secs)
    }
}

/// Flow control for the registration event subscription.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MbusConfig {
    /// Maximum buffered messages before new ones are dropped.
    pub max_pending_messages: usize,

    /// Maximum buffered payload bytes before new messages are dropped.
    pub max_pending_bytes: usize,
}

impl Default for MbusConfig {
    fn default() -> Self {
        let limits = PendingLimits::default();
        Self {
            max_pending_messages: limits.max_messages,
            max_pending_bytes: limits.max_bytes,
        }
    }
}

impl MbusConfig {
    pub fn pending_limits(&self) -> PendingLimits {
        PendingLimits {
            max_messages: self.max_pending_messages,
            max_bytes: self.max_pending_bytes,
        }
    }
}

/// Admin API (route snapshot + event feed).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address, e.g. "127.0.0.1:8089".
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8089".to_string(),
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Bind address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: RegistryConfig = toml::from_str("").unwrap();
        assert_eq!(config.pruning.interval_secs, 30);
        assert_eq!(config.pruning.stale_threshold_secs, 120);
        assert_eq!(config.mbus.max_pending_messages, 131_072);
        assert_eq!(config.mbus.max_pending_bytes, 131_072 * 1024);
        assert_eq!(config.admin.bind_address, "127.0.0.1:8089");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config: RegistryConfig = toml::from_str(
            r#"
            [pruning]
            interval_secs = 5
            stale_threshold_secs = 20

            [admin]
            bind_address = "0.0.0.0:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.pruning.interval(), Duration::from_secs(5));
        assert_eq!(config.pruning.stale_threshold(), Duration::from_secs(20));
        assert_eq!(config.admin.bind_address, "0.0.0.0:9000");
        // Untouched sections keep their defaults.
        assert_eq!(config.mbus.max_pending_messages, 131_072);
    }
}
