//! User-facing surfaces.
//!
//! This module provides:
//! - CLI definition
//! - JSON report export

pub mod cli;
pub mod report;

pub use cli::Cli;
pub use report::{build_report, default_report_name, write_report, ExportResult};
