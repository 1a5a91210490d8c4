//! File system and process scanning.
//!
//! This module provides:
//! - Directory traversal with exclusion markers
//! - Archive manifest inspection (JAR/ZIP)
//! - Running-process correlation and termination
//! - Progress events and the scan engine that ties them together

pub mod archive;
pub mod engine;
pub mod process;
pub mod progress;
pub mod targets;
pub mod walker;

pub use archive::{ArchiveContents, ArchiveScanner};
pub use engine::{ControlResult, EngineStatus, ScanEngine, ScanEngineBuilder};
pub use process::{ProcessEnumerator, ProcessInfo, ProcessMatchTable, ProcessSource};
pub use progress::{ConsoleProgressReporter, EventEmitter, NullSink, ProgressSink};
pub use targets::{full_scan_targets, quick_scan_targets};
pub use walker::DirectoryWalker;
