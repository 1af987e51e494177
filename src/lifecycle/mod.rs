//! Process lifecycle coordination.
//!
//! # Data Flow
//! ```text
//! SIGINT / ctrl-c
//!     → main triggers Shutdown
//!     → pruning cycle, subscriber, admin server observe the broadcast
//!     → each finishes its in-flight work and exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
