//! Process termination and file removal for detected threats.

use crate::core::config::RemediationConfig;
use crate::core::error::{Error, RemediationFailure, Result};
use crate::core::types::LogLevel;
use crate::quarantine::operations;
use crate::scanner::process::ProcessSource;
use crate::scanner::progress::EventEmitter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Interval between liveness checks while waiting for a killed process.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of clearing every listed threat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResult {
    pub success: bool,
    pub deleted: u32,
    pub processes_killed: u32,
    pub failed: u32,
    pub message: String,
}

impl ClearResult {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            deleted: 0,
            processes_killed: 0,
            failed: 0,
            message: message.into(),
        }
    }
}

/// Outcome of quarantining one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_path: Option<PathBuf>,
    pub message: String,
}

/// Outcome of deleting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RemediationFailure>,
    pub message: String,
}

impl DeleteResult {
    pub fn failed(failure: RemediationFailure) -> Self {
        Self {
            success: false,
            failure: Some(failure),
            message: failure.to_string(),
        }
    }
}

/// Kills processes and removes or quarantines their files.
pub struct Remediator {
    processes: Arc<dyn ProcessSource>,
    config: RemediationConfig,
    quarantine_dir: PathBuf,
    events: EventEmitter,
}

impl Remediator {
    pub fn new(
        processes: Arc<dyn ProcessSource>,
        config: RemediationConfig,
        quarantine_dir: PathBuf,
        events: EventEmitter,
    ) -> Self {
        Self {
            processes,
            config,
            quarantine_dir,
            events,
        }
    }

    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    /// Kill each pid and wait for it to exit.
    ///
    /// Returns how many processes were confirmed gone. Failures are logged
    /// and never stop the remaining pids.
    pub async fn terminate_all(&self, pids: &[u32]) -> u32 {
        if pids.is_empty() {
            return 0;
        }

        let names: HashMap<u32, String> = self
            .processes
            .snapshot()
            .map(|list| list.into_iter().map(|p| (p.pid, p.name)).collect())
            .unwrap_or_default();

        let mut killed = 0;
        for &pid in pids {
            match self.terminate(pid).await {
                Ok(()) => {
                    killed += 1;
                    let name = names.get(&pid).map(String::as_str).unwrap_or("unknown");
                    self.events.log(
                        LogLevel::Warning,
                        &format!("Killed process: {} (PID: {})", name, pid),
                    );
                }
                Err(e) => {
                    self.events
                        .log(LogLevel::Error, &format!("Failed to kill process {}: {}", pid, e));
                }
            }
        }
        killed
    }

    async fn terminate(&self, pid: u32) -> Result<()> {
        if !self.processes.is_alive(pid) {
            return Err(Error::ProcessNotFound(pid));
        }
        self.processes.kill(pid)?;

        let timeout = Duration::from_secs(self.config.kill_timeout_secs);
        let wait = async {
            while self.processes.is_alive(pid) {
                tokio::time::sleep(EXIT_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| Error::ProcessTimeout {
                pid,
                timeout_secs: self.config.kill_timeout_secs,
            })
    }

    /// Give the OS time to release handles held by killed processes.
    pub async fn release_pause(&self) {
        let pause = Duration::from_millis(self.config.release_pause_ms);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    pub fn delete(&self, path: &Path) -> Result<()> {
        operations::delete_file(path)
    }

    /// Move `path` into the quarantine directory and return its new location.
    pub fn quarantine(&self, path: &Path) -> Result<PathBuf> {
        std::fs::symlink_metadata(path).map_err(|e| {
            Error::from_io(path, e, |path, source| Error::FileRead { path, source })
        })?;

        std::fs::create_dir_all(&self.quarantine_dir).map_err(|e| Error::DirectoryAccess {
            path: self.quarantine_dir.clone(),
            source: e,
        })?;

        let dest = operations::quarantine_destination(
            &self.quarantine_dir,
            path,
            chrono::Utc::now().timestamp(),
        )?;
        operations::safe_move(path, &dest)?;
        Ok(dest)
    }
}
