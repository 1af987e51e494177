//! Subscription loop: bus messages in, registry mutations out.
//!
//! # Responsibilities
//! - Signal readiness once consuming from the inbox
//! - Dispatch per subject, one registry call per URI in a message
//! - Discard undecodable and invalid messages without surfacing errors

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};

use crate::mbus::inbox::{BusMessage, InboxReceiver, REGISTER_SUBJECT, UNREGISTER_SUBJECT};
use crate::mbus::message::RegistryMessage;
use crate::observability::metrics;
use crate::registry::RouteRegistry;

pub struct Subscriber {
    registry: Arc<RouteRegistry>,
}

impl Subscriber {
    pub fn new(registry: Arc<RouteRegistry>) -> Self {
        Self { registry }
    }

    /// Consume the inbox until it closes or shutdown fires. `ready` is
    /// signalled once the subscription is established, before the first
    /// message is handled.
    pub async fn run(
        self,
        mut inbox: InboxReceiver,
        ready: oneshot::Sender<()>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let _ = ready.send(());
        tracing::info!("route event subscription established");

        loop {
            tokio::select! {
                message = inbox.recv() => match message {
                    Some(message) => self.handle(message),
                    None => {
                        tracing::info!("event inbox closed; subscriber exiting");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("subscriber received shutdown signal");
                    break;
                }
            }
        }
    }

    fn handle(&self, message: BusMessage) {
        match message.subject.as_str() {
            REGISTER_SUBJECT => self.register_routes(&message.payload),
            UNREGISTER_SUBJECT => self.unregister_routes(&message.payload),
            subject => {
                tracing::trace!(subject, "ignoring message on unhandled subject");
            }
        }
    }

    fn register_routes(&self, payload: &[u8]) {
        let Some(message) = Self::decode(payload) else {
            return;
        };
        let endpoint = message.endpoint();
        for uri in &message.uris {
            self.registry.register(uri, endpoint.clone());
        }
    }

    fn unregister_routes(&self, payload: &[u8]) {
        let Some(message) = Self::decode(payload) else {
            return;
        };
        let endpoint = message.endpoint();
        for uri in &message.uris {
            self.registry.unregister(uri, &endpoint);
        }
    }

    fn decode(payload: &[u8]) -> Option<RegistryMessage> {
        match RegistryMessage::decode(payload) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!(error = %e, "discarding registry message");
                metrics::record_message_dropped("invalid");
                None
            }
        }
    }
}
