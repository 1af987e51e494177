//! Message-bus adapter for route registration events.
//!
//! # Data Flow
//! ```text
//! transport (HTTP event feed, broker client, ...)
//!     → inbox.rs (bounded buffer, drops beyond pending limits)
//!     → subscriber.rs (decode, validate, dispatch per subject)
//!     → RouteRegistry.register / .unregister, one call per URI
//! ```
//!
//! # Design Decisions
//! - Delivery is best-effort: malformed and invalid messages are dropped
//!   here and never reach the registry; duplicates and gaps are tolerated
//!   (register is idempotent, unregister of unknown is a no-op)
//! - Backpressure is explicit: a full inbox drops new messages instead of
//!   growing without bound

pub mod inbox;
pub mod message;
pub mod subscriber;

pub use inbox::{BusMessage, InboxReceiver, InboxSender, PendingLimits};
pub use message::RegistryMessage;
pub use subscriber::Subscriber;
