//! Route Registry Control Plane Library
//!
//! The routing-table core of a lightweight reverse-proxy control plane:
//! a concurrent prefix-trie registry of URI → backend-endpoint pools,
//! kept current by registration events and swept for staleness by a
//! suspendable background task.

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod mbus;
pub mod observability;
pub mod registry;
pub mod route;

pub use config::RegistryConfig;
pub use lifecycle::Shutdown;
pub use registry::RouteRegistry;
pub use route::{Endpoint, Pool, RouteUri};
