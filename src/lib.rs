//! cheatscan: a scan-and-remediate engine for game cheat clients
//!
//! This crate walks the file system for executables and Java archives whose
//! names or manifests match known cheat clients, correlates hits with running
//! processes, and can terminate those processes before deleting or
//! quarantining the files. Front ends observe the engine through a
//! [`scanner::ProgressSink`].

pub mod core;
pub mod detection;
pub mod quarantine;
pub mod scanner;
pub mod ui;
pub mod update;
pub mod utils;

// Re-export commonly used types
pub use crate::core::config::Config;
pub use crate::core::error::{Error, Result};
pub use crate::core::types::*;
pub use crate::scanner::{ControlResult, EngineStatus, ScanEngine};
