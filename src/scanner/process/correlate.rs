//! Correlation between threat files and running processes.

use crate::core::config::ScanConfig;
use crate::scanner::process::{ProcessInfo, ProcessSource};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Process ids believed to be running each threat file.
///
/// Filled during the scan, drained by remediation.
#[derive(Debug, Default)]
pub struct ProcessMatchTable {
    inner: Mutex<HashMap<PathBuf, Vec<u32>>>,
}

impl ProcessMatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<u32>>> {
        // The map holds plain data; a panic elsewhere cannot leave it torn.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add pids for a path, keeping first-seen order without duplicates.
    pub fn record(&self, path: &Path, pids: &[u32]) {
        let mut table = self.lock();
        let entry = table.entry(path.to_path_buf()).or_default();
        for pid in pids {
            if !entry.contains(pid) {
                entry.push(*pid);
            }
        }
    }

    pub fn pids(&self, path: &Path) -> Vec<u32> {
        self.lock().get(path).cloned().unwrap_or_default()
    }

    pub fn remove(&self, path: &Path) -> Vec<u32> {
        self.lock().remove(path).unwrap_or_default()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Finds processes executing a detected file.
pub struct ProcessCorrelator {
    source: Arc<dyn ProcessSource>,
    archive_extensions: Vec<String>,
}

impl ProcessCorrelator {
    pub fn new(source: Arc<dyn ProcessSource>, config: &ScanConfig) -> Self {
        Self {
            source,
            archive_extensions: config
                .archive_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.archive_extensions.contains(&ext))
    }

    /// Pids of processes running `path`, in process-list order.
    ///
    /// Archives match when any argument contains the file name (they run
    /// inside an interpreter); executables match on their image name.
    pub fn matching_pids(&self, path: &Path) -> Vec<u32> {
        let Some(base_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return Vec::new();
        };

        let processes = match self.source.snapshot() {
            Ok(processes) => processes,
            Err(e) => {
                log::debug!("Process list unavailable: {}", e);
                return Vec::new();
            }
        };

        let archive = self.is_archive(path);
        let matches = |p: &ProcessInfo| {
            if archive {
                p.args.iter().any(|arg| arg.contains(base_name.as_str()))
            } else {
                p.name.eq_ignore_ascii_case(&base_name)
            }
        };

        let mut pids: Vec<u32> = Vec::new();
        for process in processes.iter().filter(|p| matches(p)) {
            if !pids.contains(&process.pid) {
                pids.push(process.pid);
            }
        }
        pids
    }

    /// Whether `path` is running, recording any matches into `table`.
    pub fn is_running(&self, path: &Path, table: &ProcessMatchTable) -> bool {
        let pids = self.matching_pids(path);
        if pids.is_empty() {
            return false;
        }
        log::debug!("{:?} is running as pid(s) {:?}", path, pids);
        table.record(path, &pids);
        true
    }
}
