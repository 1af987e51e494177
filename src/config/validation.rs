//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and address syntax
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: RegistryConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RegistryConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("pruning.stale_threshold_secs must be positive")]
    ZeroStaleThreshold,

    #[error("mbus pending limits must be positive")]
    ZeroPendingLimit,

    #[error("invalid {field} address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pruning.stale_threshold_secs == 0 {
        errors.push(ValidationError::ZeroStaleThreshold);
    }

    if config.mbus.max_pending_messages == 0 || config.mbus.max_pending_bytes == 0 {
        errors.push(ValidationError::ZeroPendingLimit);
    }

    if config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RegistryConfig::default()).is_ok());
    }

    #[test]
    fn test_all_errors_are_reported() {
        let mut config = RegistryConfig::default();
        config.pruning.stale_threshold_secs = 0;
        config.mbus.max_pending_messages = 0;
        config.admin.bind_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = RegistryConfig::default();
        config.observability.metrics_address = "bogus".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
