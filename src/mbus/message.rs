//! Route registration wire format.
//!
//! # Responsibilities
//! - Decode registration/unregistration payloads
//! - Enforce the https requirement on route-service URLs
//! - Build the endpoint a message describes

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::route::{Endpoint, ModificationTag, RouteUri};

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed registry message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("route_service_url must be empty or use the https scheme")]
    RouteServiceUrlScheme,
}

/// One route registration or unregistration event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryMessage {
    pub host: String,
    pub port: u16,
    pub uris: Vec<RouteUri>,
    pub tags: HashMap<String, String>,
    pub app: String,
    pub stale_threshold_in_seconds: u64,
    pub route_service_url: String,
    pub private_instance_id: String,
    pub private_instance_index: String,
}

impl RegistryMessage {
    /// Decode and validate a payload. Failures of either kind are dropped
    /// at this boundary; they never reach the registry.
    pub fn decode(payload: &[u8]) -> Result<Self, MessageError> {
        let message: RegistryMessage = serde_json::from_slice(payload)?;
        if !message.is_valid() {
            return Err(MessageError::RouteServiceUrlScheme);
        }
        Ok(message)
    }

    fn is_valid(&self) -> bool {
        self.route_service_url.is_empty() || self.route_service_url.starts_with("https")
    }

    /// The endpoint this message describes. A zero staleness threshold
    /// means "use the pool default".
    pub fn endpoint(&self) -> Endpoint {
        let stale_threshold = (self.stale_threshold_in_seconds > 0)
            .then(|| Duration::from_secs(self.stale_threshold_in_seconds));
        Endpoint::new(
            self.app.clone(),
            self.host.clone(),
            self.port,
            self.private_instance_id.clone(),
            self.private_instance_index.clone(),
            self.tags.clone(),
            stale_threshold,
            self.route_service_url.clone(),
            ModificationTag::new(),
        )
    }
}
