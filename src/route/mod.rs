//! Route domain model.
//!
//! # Data Flow
//! ```text
//! Registration message
//!     → uri.rs (normalize raw URI into a RouteKey)
//!     → endpoint.rs (backend identity + metadata)
//!     → pool.rs (per-route endpoint set with freshness bookkeeping)
//! ```
//!
//! # Design Decisions
//! - Identity is the canonical `host:port` address, never the full record
//! - Pools carry no clock and no lock; the registry supplies both

pub mod endpoint;
pub mod pool;
pub mod uri;

pub use endpoint::{Endpoint, ModificationTag};
pub use pool::Pool;
pub use uri::{RouteKey, RouteUri};
