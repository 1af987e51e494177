//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, env-filtered in main)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap atomic operations; safe on mutation paths
//! - The exporter is optional: helpers are no-ops until init_metrics runs

pub mod metrics;
