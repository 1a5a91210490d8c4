//! Threat remediation.
//!
//! This module handles:
//! - Terminating processes that run a detected file
//! - Deleting detected files
//! - Moving files into the quarantine directory

pub mod operations;
pub mod remediation;

pub use operations::{delete_file, safe_move, QUARANTINE_SUFFIX};
pub use remediation::{ClearResult, DeleteResult, QuarantineResult, Remediator};
