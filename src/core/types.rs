//! Core type definitions used throughout cheatscan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sentinel stored in place of a content hash that could not be computed.
pub const HASH_UNAVAILABLE: &str = "unavailable";

/// Lifecycle state of the scan engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    /// No scan is running
    Idle,
    /// A scan task is walking the targets
    Running,
    /// A stop was requested; the task exits at the next file boundary
    Stopping,
}

impl ScanState {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            ScanState::Idle => 0,
            ScanState::Running => 1,
            ScanState::Stopping => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => ScanState::Running,
            2 => ScanState::Stopping,
            _ => ScanState::Idle,
        }
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Idle => write!(f, "Idle"),
            ScanState::Running => write!(f, "Running"),
            ScanState::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Which set of roots a scan walks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// User-level download, desktop and game data folders
    Quick,
    /// Every mounted volume
    Full,
    /// Caller-supplied roots
    Custom(Vec<PathBuf>),
}

impl ScanMode {
    /// Parse the mode names used by front ends ("quick", "full").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "quick" => Some(ScanMode::Quick),
            "full" | "deep" => Some(ScanMode::Full),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Quick => write!(f, "quick"),
            ScanMode::Full => write!(f, "full"),
            ScanMode::Custom(paths) => write!(f, "custom ({} path(s))", paths.len()),
        }
    }
}

/// A root path to traverse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanTarget(PathBuf);

impl ScanTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Aggregate counters for the current (or last) scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    /// Candidate files fully classified
    pub scanned: u64,
    /// Files classified as threats
    pub threats: u64,
    /// Files classified as clean
    pub clean: u64,
    /// When the scan started
    pub start_time: Option<DateTime<Utc>>,
}

impl ScanStats {
    /// Fresh counters stamped with the current time.
    pub fn started_now() -> Self {
        Self {
            start_time: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Seconds since the scan started, or zero if it never did.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|start| (Utc::now() - start).num_milliseconds().max(0) as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

/// Result of classifying one candidate file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Stable identifier derived from the path
    pub id: String,
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    /// SHA-256 over the leading bytes, or [`HASH_UNAVAILABLE`]
    pub content_hash_prefix: String,
    pub is_threat: bool,
    /// 0 for clean files, 2 or 3 for threats
    pub threat_level: u8,
    pub threat_name: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub is_running: bool,
}

/// Per-file outcome of the scan pipeline.
///
/// `Skipped` keeps "could not be classified" apart from "classified clean".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Threat(FileRecord),
    Clean(FileRecord),
    Skipped { path: PathBuf, reason: String },
}

/// Severity of a log event sent to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Matching level on the `log` facade.
    pub fn as_log_level(self) -> log::Level {
        match self {
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Display status of a listed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Threat,
    Quarantined,
    Deleted,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Threat => write!(f, "threat"),
            FileStatus::Quarantined => write!(f, "quarantined"),
            FileStatus::Deleted => write!(f, "deleted"),
        }
    }
}
