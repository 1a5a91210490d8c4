//! Process enumeration and correlation with detected files.
//!
//! This module provides:
//! - Process listing with command lines
//! - Forced termination with a bounded wait for exit
//! - Mapping of threat files to the processes running them

pub mod correlate;
pub mod enumerate;

pub use correlate::{ProcessCorrelator, ProcessMatchTable};
pub use enumerate::{terminate_process, ProcessEnumerator, ProcessInfo};

use crate::core::error::Result;

/// Source of live process information.
///
/// The engine depends on this seam rather than the host process table so
/// correlation and remediation can run against a fixed set of processes.
pub trait ProcessSource: Send + Sync {
    /// Current process list. Entries that vanish while listing are omitted.
    fn snapshot(&self) -> Result<Vec<ProcessInfo>>;

    /// Whether the process still exists and has not exited.
    fn is_alive(&self, pid: u32) -> bool;

    /// Request forced termination. Does not wait for exit.
    fn kill(&self, pid: u32) -> Result<()>;
}
