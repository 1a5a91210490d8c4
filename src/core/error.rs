//! Error types and result handling for cheatscan.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cheatscan operations.
#[derive(Error, Debug)]
pub enum Error {
    // ===== I/O Errors =====
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete file: {path}")]
    FileDelete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to access directory: {path}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Permission denied: {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===== Configuration Errors =====
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Failed to save configuration: {0}")]
    ConfigSave(String),

    #[error("Invalid configuration value: {field} - {message}")]
    ConfigInvalid { field: String, message: String },

    // ===== Scanning Errors =====
    #[error("Scan already in progress")]
    ScanAlreadyRunning,

    #[error("No scan in progress")]
    ScanNotRunning,

    #[error("Cannot modify results while a scan is active")]
    ScanBusy,

    #[error("Failed to scan file: {path} - {reason}")]
    ScanError { path: PathBuf, reason: String },

    #[error("Archive could not be read: {path}")]
    ArchiveError {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ===== Remediation Errors =====
    #[error("Failed to quarantine file: {path}")]
    QuarantineFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No threats to clear")]
    NothingToClear,

    #[error("Another remediation is in progress")]
    RemediationInProgress,

    // ===== Process Errors =====
    #[error("Failed to enumerate processes: {0}")]
    ProcessEnumeration(String),

    #[error("Failed to terminate process {pid}: {reason}")]
    ProcessTermination { pid: u32, reason: String },

    #[error("Process {pid} did not exit within {timeout_secs}s")]
    ProcessTimeout { pid: u32, timeout_secs: u64 },

    #[error("Process not found: {0}")]
    ProcessNotFound(u32),

    // ===== Update Errors =====
    #[error("Update failed: {0}")]
    UpdateFailed(String),

    #[error("Invalid version string: {0}")]
    InvalidVersion(String),

    // ===== Concurrency Errors =====
    #[error("No async runtime available to run the scan")]
    NoRuntime,

    // ===== Serialization Errors =====
    #[error("JSON serialization error")]
    JsonSerialize(#[from] serde_json::Error),

    // ===== Generic Errors =====
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl Error {
    /// Create a file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a scan error.
    pub fn scan_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ScanError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Map an I/O error on `path` onto the most specific variant.
    ///
    /// `NotFound` and `PermissionDenied` get their own variants so callers can
    /// report them distinctly; anything else falls back to `fallback`.
    pub fn from_io<F>(path: impl Into<PathBuf>, source: std::io::Error, fallback: F) -> Self
    where
        F: FnOnce(PathBuf, std::io::Error) -> Error,
    {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::PathNotFound(path),
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied { path, source },
            _ => fallback(path, source),
        }
    }

    /// Check if this error is recoverable (scan can continue).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FileRead { .. }
                | Error::PathNotFound(_)
                | Error::PermissionDenied { .. }
                | Error::DirectoryAccess { .. }
                | Error::ScanError { .. }
                | Error::ArchiveError { .. }
                | Error::Io(_)
        )
    }

    /// Classify a remediation error into the kinds reported to callers.
    pub fn remediation_failure(&self) -> RemediationFailure {
        match self {
            Error::PathNotFound(_) => RemediationFailure::NotFound,
            Error::PermissionDenied { .. } => RemediationFailure::PermissionDenied,
            Error::FileDelete { source, .. } | Error::FileWrite { source, .. } => {
                match source.kind() {
                    std::io::ErrorKind::NotFound => RemediationFailure::NotFound,
                    std::io::ErrorKind::PermissionDenied => RemediationFailure::PermissionDenied,
                    _ => RemediationFailure::Other,
                }
            }
            _ => RemediationFailure::Other,
        }
    }

    /// Get a user-friendly suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::PermissionDenied { .. } => {
                Some("Try running with elevated privileges (sudo/administrator)")
            }
            Error::PathNotFound(_) => Some("Check that the path exists and is accessible"),
            Error::ConfigLoad(_) | Error::ConfigInvalid { .. } => {
                Some("Check your configuration file for syntax errors or missing fields")
            }
            Error::ScanAlreadyRunning | Error::ScanBusy | Error::RemediationInProgress => {
                Some("Stop the running scan or wait for it to finish")
            }
            Error::ProcessTermination { .. } | Error::ProcessTimeout { .. } => {
                Some("Close the program manually and retry")
            }
            _ => None,
        }
    }

    /// Get the error category for logging.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::FileRead { .. }
            | Error::FileWrite { .. }
            | Error::FileDelete { .. }
            | Error::DirectoryAccess { .. }
            | Error::PathNotFound(_)
            | Error::PermissionDenied { .. }
            | Error::Io(_) => ErrorCategory::Io,

            Error::ConfigLoad(_) | Error::ConfigSave(_) | Error::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }

            Error::ScanAlreadyRunning
            | Error::ScanNotRunning
            | Error::ScanBusy
            | Error::ScanError { .. }
            | Error::ArchiveError { .. } => ErrorCategory::Scanning,

            Error::QuarantineFailed { .. }
            | Error::NothingToClear
            | Error::RemediationInProgress => ErrorCategory::Remediation,

            Error::ProcessEnumeration(_)
            | Error::ProcessTermination { .. }
            | Error::ProcessTimeout { .. }
            | Error::ProcessNotFound(_) => ErrorCategory::Process,

            Error::UpdateFailed(_) | Error::InvalidVersion(_) => ErrorCategory::Update,

            Error::NoRuntime => ErrorCategory::Concurrency,

            Error::JsonSerialize(_) => ErrorCategory::Serialization,

            Error::Internal(_) | Error::Other(_) => ErrorCategory::Other,
        }
    }
}

/// Distinguishable reasons a delete or quarantine can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationFailure {
    NotFound,
    PermissionDenied,
    Other,
}

impl std::fmt::Display for RemediationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Other => write!(f, "failed"),
        }
    }
}

/// Error category for classification and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Scanning,
    Remediation,
    Process,
    Update,
    Concurrency,
    Serialization,
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io => write!(f, "I/O"),
            Self::Configuration => write!(f, "Configuration"),
            Self::Scanning => write!(f, "Scanning"),
            Self::Remediation => write!(f, "Remediation"),
            Self::Process => write!(f, "Process"),
            Self::Update => write!(f, "Update"),
            Self::Concurrency => write!(f, "Concurrency"),
            Self::Serialization => write!(f, "Serialization"),
            Self::Other => write!(f, "Other"),
        }
    }
}
