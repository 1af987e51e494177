//! Bounded inbox between the transport layer and the subscriber.
//!
//! # Responsibilities
//! - Buffer inbound bus messages with explicit pending limits
//! - Drop (and count) messages beyond the limits instead of growing
//!
//! # Design Decisions
//! - Limits are message count and payload bytes, both double a
//!   conservative default, matching the subscription flow-control contract
//! - Accounting is two atomics shared by sender and receiver; a marginal
//!   overshoot under racing publishers is acceptable for a drop threshold

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::observability::metrics;

/// Subject carried by route registration events.
pub const REGISTER_SUBJECT: &str = "router.register";
/// Subject carried by route unregistration events.
pub const UNREGISTER_SUBJECT: &str = "router.unregister";

/// One message as delivered by the transport.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(subject: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }
}

/// Flow-control limits for buffered messages.
#[derive(Debug, Clone, Copy)]
pub struct PendingLimits {
    pub max_messages: usize,
    pub max_bytes: usize,
}

impl Default for PendingLimits {
    fn default() -> Self {
        Self {
            max_messages: 131_072,
            max_bytes: 131_072 * 1024,
        }
    }
}

#[derive(Debug, Default)]
struct Accounting {
    messages: AtomicUsize,
    bytes: AtomicUsize,
}

/// Publishing half, held by the transport layer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: mpsc::UnboundedSender<BusMessage>,
    limits: PendingLimits,
    accounting: Arc<Accounting>,
}

/// Consuming half, held by the subscriber.
#[derive(Debug)]
pub struct InboxReceiver {
    rx: mpsc::UnboundedReceiver<BusMessage>,
    accounting: Arc<Accounting>,
}

/// Create a bounded inbox pair.
pub fn bounded(limits: PendingLimits) -> (InboxSender, InboxReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let accounting = Arc::new(Accounting::default());
    (
        InboxSender {
            tx,
            limits,
            accounting: accounting.clone(),
        },
        InboxReceiver { rx, accounting },
    )
}

impl InboxSender {
    /// Publish a message unless the inbox is over its limits or closed.
    /// Returns false when the message was dropped.
    pub fn try_publish(&self, message: BusMessage) -> bool {
        let pending_messages = self.accounting.messages.load(Ordering::Relaxed);
        let pending_bytes = self.accounting.bytes.load(Ordering::Relaxed);
        let size = message.payload.len();

        if pending_messages >= self.limits.max_messages
            || pending_bytes + size > self.limits.max_bytes
        {
            metrics::record_message_dropped("backpressure");
            tracing::warn!(
                subject = %message.subject,
                pending_messages,
                pending_bytes,
                "inbox over pending limits; dropping message"
            );
            return false;
        }

        self.accounting.messages.fetch_add(1, Ordering::Relaxed);
        self.accounting.bytes.fetch_add(size, Ordering::Relaxed);

        if self.tx.send(message).is_err() {
            self.accounting.messages.fetch_sub(1, Ordering::Relaxed);
            self.accounting.bytes.fetch_sub(size, Ordering::Relaxed);
            metrics::record_message_dropped("closed");
            return false;
        }
        true
    }
}

impl InboxReceiver {
    /// Receive the next message, releasing its accounting. Returns `None`
    /// once every sender is gone and the buffer is drained.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        let message = self.rx.recv().await?;
        self.accounting.messages.fetch_sub(1, Ordering::Relaxed);
        self.accounting
            .bytes
            .fetch_sub(message.payload.len(), Ordering::Relaxed);
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let (tx, mut rx) = bounded(PendingLimits::default());
        assert!(tx.try_publish(BusMessage::new(REGISTER_SUBJECT, b"{}".to_vec())));

        let message = rx.recv().await.unwrap();
        assert_eq!(message.subject, REGISTER_SUBJECT);
    }

    #[tokio::test]
    async fn test_message_limit_drops_then_recovers() {
        let limits = PendingLimits {
            max_messages: 2,
            max_bytes: 1024,
        };
        let (tx, mut rx) = bounded(limits);

        assert!(tx.try_publish(BusMessage::new("a", b"1".to_vec())));
        assert!(tx.try_publish(BusMessage::new("b", b"2".to_vec())));
        assert!(!tx.try_publish(BusMessage::new("c", b"3".to_vec())));

        // Draining one frees a slot.
        rx.recv().await.unwrap();
        assert!(tx.try_publish(BusMessage::new("d", b"4".to_vec())));
    }

    #[tokio::test]
    async fn test_byte_limit_drops_large_payloads() {
        let limits = PendingLimits {
            max_messages: 100,
            max_bytes: 10,
        };
        let (tx, _rx) = bounded(limits);

        assert!(tx.try_publish(BusMessage::new("a", vec![0u8; 8])));
        assert!(!tx.try_publish(BusMessage::new("b", vec![0u8; 8])));
        assert!(tx.try_publish(BusMessage::new("c", vec![0u8; 2])));
    }

    #[tokio::test]
    async fn test_publish_to_closed_inbox_fails() {
        let (tx, rx) = bounded(PendingLimits::default());
        drop(rx);
        assert!(!tx.try_publish(BusMessage::new("a", b"1".to_vec())));
    }
}
