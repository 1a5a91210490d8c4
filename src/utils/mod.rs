//! Hashing and logging helpers.

pub mod hash;
pub mod logging;

pub use hash::HashCalculator;
pub use logging::{cleanup_old_logs, init_logging, LogConfig};
