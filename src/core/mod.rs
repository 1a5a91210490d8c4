//! Shared types, configuration and the crate error type.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::{FileRecord, ScanMode, ScanState, ScanStats};
