//! Scan orchestration and the engine control surface.
//!
//! One background task walks the targets, classifies each candidate and
//! correlates threats with running processes. Front ends drive the engine
//! through the methods on [`ScanEngine`] and observe it through a
//! [`ProgressSink`].
//!
//! Cancellation is cooperative: the state is checked once before each file,
//! so a stop request takes effect after the in-flight file finishes.

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::{
    FileRecord, FileStatus, LogLevel, ScanMode, ScanOutcome, ScanState, ScanStats, ScanTarget,
};
use crate::detection::{Classifier, SignatureTable};
use crate::quarantine::{ClearResult, DeleteResult, QuarantineResult, Remediator};
use crate::scanner::process::{
    ProcessCorrelator, ProcessEnumerator, ProcessMatchTable, ProcessSource,
};
use crate::scanner::progress::{
    estimate_percent, EventEmitter, NullSink, ProgressSink, ProgressThrottle,
};
use crate::scanner::targets::{full_scan_targets, quick_scan_targets};
use crate::scanner::walker::DirectoryWalker;
use crate::ui::report::{self, ExportResult, ReportInput};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Reply to a synchronous control request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResult {
    pub success: bool,
    pub message: String,
}

impl ControlResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub state: ScanState,
    pub stats: ScanStats,
    pub threat_count: usize,
    pub elapsed_secs: f64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Guarded values are plain data updated in single statements.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State shared between the control surface and the scan task.
struct EngineShared {
    config: Arc<Config>,
    state: AtomicU8,
    remediating: AtomicBool,
    stats: Mutex<ScanStats>,
    threats: Mutex<Vec<FileRecord>>,
    matches: ProcessMatchTable,
    classifier: Classifier,
    correlator: ProcessCorrelator,
    walker: DirectoryWalker,
    events: EventEmitter,
    full_targets: Vec<ScanTarget>,
    quick_targets: Vec<ScanTarget>,
}

impl EngineShared {
    fn state(&self) -> ScanState {
        ScanState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn transition(&self, from: ScanState, to: ScanState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn stats(&self) -> ScanStats {
        *lock(&self.stats)
    }

    /// Body of the background scan task.
    fn run(&self, mode: ScanMode, targets: Vec<ScanTarget>) {
        self.events.log(
            LogLevel::Info,
            &format!("Starting {} scan of {} location(s)", mode, targets.len()),
        );

        let scan = &self.config.scan;
        let mut throttle = ProgressThrottle::new(
            scan.progress_every_files,
            Duration::from_millis(scan.progress_interval_ms),
        );

        'targets: for target in &targets {
            log::debug!("Walking {}", target);
            for path in self.walker.walk(target.path()) {
                if self.state() != ScanState::Running {
                    break 'targets;
                }

                let outcome = self.scan_file(&path);
                self.record(outcome);

                if throttle.tick() {
                    self.emit_progress(&path);
                }
            }
        }

        self.finish();
    }

    /// Classify one file and correlate it if it is a threat.
    fn scan_file(&self, path: &Path) -> ScanOutcome {
        match self.classifier.inspect(path) {
            Ok(mut record) if record.is_threat => {
                record.is_running = self.correlator.is_running(path, &self.matches);
                ScanOutcome::Threat(record)
            }
            Ok(record) => ScanOutcome::Clean(record),
            Err(e) => ScanOutcome::Skipped {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        }
    }

    fn record(&self, outcome: ScanOutcome) {
        match outcome {
            ScanOutcome::Threat(record) => {
                lock(&self.threats).push(record.clone());
                {
                    let mut stats = lock(&self.stats);
                    stats.scanned += 1;
                    stats.threats += 1;
                }

                self.events.log(
                    LogLevel::Warning,
                    &format!(
                        "Threat found: {} - {}{}",
                        record.threat_name.as_deref().unwrap_or("Unknown"),
                        record.path.display(),
                        if record.is_running { " (running)" } else { "" }
                    ),
                );
                self.events.file_added(&record);
                self.events
                    .status_changed(&record.id, FileStatus::Threat, Some(&record));
            }
            ScanOutcome::Clean(_) => {
                let mut stats = lock(&self.stats);
                stats.scanned += 1;
                stats.clean += 1;
            }
            ScanOutcome::Skipped { path, reason } => {
                log::trace!("Skipped {:?}: {}", path, reason);
            }
        }
    }

    fn emit_progress(&self, current: &Path) {
        let stats = self.stats();
        let name = current
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.events.stats(stats.scanned, stats.threats, stats.clean);
        self.events.progress(estimate_percent(stats.scanned), &name);
        self.events.timer(stats.elapsed_secs());
    }

    fn finish(&self) {
        let previous = ScanState::from_u8(self.state.swap(ScanState::Idle.as_u8(), Ordering::SeqCst));
        let stats = self.stats();
        let verb = if previous == ScanState::Stopping {
            "stopped"
        } else {
            "complete"
        };

        self.events.log(
            LogLevel::Info,
            &format!(
                "Scan {}: {} file(s) scanned, {} threat(s), {} clean in {:.1}s",
                verb,
                stats.scanned,
                stats.threats,
                stats.clean,
                stats.elapsed_secs()
            ),
        );
        self.events.stats(stats.scanned, stats.threats, stats.clean);
        self.events.timer(stats.elapsed_secs());
        self.events.complete();
    }

    /// Drop a remediated file from the results.
    fn forget(&self, path: &Path) -> Option<FileRecord> {
        self.matches.remove(path);
        let mut threats = lock(&self.threats);
        let index = threats.iter().position(|t| t.path == path)?;
        Some(threats.remove(index))
    }
}

/// Marks a remediation as in progress for its lifetime.
struct RemediationGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RemediationGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Builder for [`ScanEngine`].
pub struct ScanEngineBuilder {
    config: Config,
    sink: Arc<dyn ProgressSink>,
    processes: Arc<dyn ProcessSource>,
    signatures: SignatureTable,
    targets: Option<(Vec<ScanTarget>, Vec<ScanTarget>)>,
}

impl ScanEngineBuilder {
    /// Receiver for progress and log events.
    pub fn sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Process table used for correlation and termination.
    pub fn process_source(mut self, processes: Arc<dyn ProcessSource>) -> Self {
        self.processes = processes;
        self
    }

    pub fn signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = signatures;
        self
    }

    /// Override the full and quick roots instead of probing the host.
    pub fn targets(mut self, full: Vec<ScanTarget>, quick: Vec<ScanTarget>) -> Self {
        self.targets = Some((full, quick));
        self
    }

    pub fn build(self) -> ScanEngine {
        let config = Arc::new(self.config);
        let scan_config = Arc::new(config.scan.clone());
        let events = EventEmitter::new(self.sink);
        let (full_targets, quick_targets) = self
            .targets
            .unwrap_or_else(|| (full_scan_targets(), quick_scan_targets()));

        let remediator = Remediator::new(
            Arc::clone(&self.processes),
            config.remediation.clone(),
            config.quarantine.quarantine_dir(),
            events.clone(),
        );

        let shared = EngineShared {
            classifier: Classifier::new(Arc::clone(&scan_config), Arc::new(self.signatures)),
            correlator: ProcessCorrelator::new(self.processes, &scan_config),
            walker: DirectoryWalker::new(&scan_config),
            config,
            state: AtomicU8::new(ScanState::Idle.as_u8()),
            remediating: AtomicBool::new(false),
            stats: Mutex::new(ScanStats::default()),
            threats: Mutex::new(Vec::new()),
            matches: ProcessMatchTable::new(),
            events,
            full_targets,
            quick_targets,
        };

        ScanEngine {
            shared: Arc::new(shared),
            task: Mutex::new(None),
            remediator,
        }
    }
}

/// The scan-and-remediate engine.
pub struct ScanEngine {
    shared: Arc<EngineShared>,
    task: Mutex<Option<JoinHandle<()>>>,
    remediator: Remediator,
}

impl ScanEngine {
    /// Engine over the host process table with no event sink.
    pub fn new(config: Config) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> ScanEngineBuilder {
        ScanEngineBuilder {
            config,
            sink: Arc::new(NullSink),
            processes: Arc::new(ProcessEnumerator::new()),
            signatures: SignatureTable::builtin(),
            targets: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn signatures(&self) -> &SignatureTable {
        self.shared.classifier.signatures()
    }

    pub fn state(&self) -> ScanState {
        self.shared.state()
    }

    pub fn stats(&self) -> ScanStats {
        self.shared.stats()
    }

    /// Copy of the current threat list.
    pub fn threats(&self) -> Vec<FileRecord> {
        lock(&self.shared.threats).clone()
    }

    pub fn status(&self) -> EngineStatus {
        let stats = self.stats();
        EngineStatus {
            state: self.state(),
            stats,
            threat_count: lock(&self.shared.threats).len(),
            elapsed_secs: stats.elapsed_secs(),
        }
    }

    /// Roots walked for a mode.
    pub fn scan_targets(&self, mode: &ScanMode) -> Vec<ScanTarget> {
        match mode {
            ScanMode::Quick => self.shared.quick_targets.clone(),
            ScanMode::Full => self.shared.full_targets.clone(),
            ScanMode::Custom(paths) => paths.iter().cloned().map(ScanTarget::new).collect(),
        }
    }

    /// Process ids recorded for a threat file.
    pub fn matched_pids(&self, path: &Path) -> Vec<u32> {
        self.shared.matches.pids(path)
    }

    /// Start a scan on a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_scan(&self, mode: ScanMode) -> ControlResult {
        match self.try_start(mode) {
            Ok(message) => ControlResult::ok(message),
            Err(e) => {
                log::warn!("Scan not started: {}", e);
                ControlResult::failed(e.to_string())
            }
        }
    }

    fn try_start(&self, mode: ScanMode) -> Result<String> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let shared = &self.shared;

        if !shared.transition(ScanState::Idle, ScanState::Running) {
            return Err(Error::ScanAlreadyRunning);
        }
        if shared.remediating.load(Ordering::SeqCst) {
            shared.state.store(ScanState::Idle.as_u8(), Ordering::SeqCst);
            return Err(Error::RemediationInProgress);
        }

        *lock(&shared.stats) = ScanStats::started_now();
        lock(&shared.threats).clear();
        shared.matches.clear();

        let targets = self.scan_targets(&mode);
        let message = format!("Scan started ({})", mode);
        let task_shared = Arc::clone(shared);
        let handle = runtime.spawn_blocking(move || task_shared.run(mode, targets));
        *lock(&self.task) = Some(handle);

        Ok(message)
    }

    /// Ask the running scan to stop after its current file.
    pub fn stop_scan(&self) -> ControlResult {
        if self
            .shared
            .transition(ScanState::Running, ScanState::Stopping)
        {
            self.shared.events.log(LogLevel::Info, "Stopping scan...");
            ControlResult::ok("Stopping scan")
        } else {
            ControlResult::failed(Error::ScanNotRunning.to_string())
        }
    }

    /// Wait for the background scan task, if any, to finish.
    pub async fn wait(&self) -> Result<()> {
        let handle = lock(&self.task).take();
        match handle {
            Some(handle) => handle
                .await
                .map_err(|e| Error::Internal(format!("Scan task failed: {}", e))),
            None => Ok(()),
        }
    }

    /// Reserve the results for a remediation.
    fn begin_remediation(&self) -> Result<RemediationGuard<'_>> {
        let flag = &self.shared.remediating;
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::RemediationInProgress);
        }
        let guard = RemediationGuard { flag };
        if self.state() != ScanState::Idle {
            return Err(Error::ScanBusy);
        }
        Ok(guard)
    }

    /// Kill, then delete, every listed threat.
    pub async fn clear_threats(&self) -> ClearResult {
        let _guard = match self.begin_remediation() {
            Ok(guard) => guard,
            Err(e) => return ClearResult::rejected(e.to_string()),
        };

        let threats = self.threats();
        if threats.is_empty() {
            return ClearResult::rejected(Error::NothingToClear.to_string());
        }

        let events = &self.shared.events;
        events.log(
            LogLevel::Info,
            &format!("Clearing {} threat(s)...", threats.len()),
        );

        let mut deleted = 0;
        let mut failed = 0;
        let mut processes_killed = 0;

        for threat in &threats {
            let pids = self.shared.matches.pids(&threat.path);
            processes_killed += self.remediator.terminate_all(&pids).await;
            self.remediator.release_pause().await;

            let label = threat.threat_name.as_deref().unwrap_or("Unknown");
            match self.remediator.delete(&threat.path) {
                Ok(()) => {
                    deleted += 1;
                    self.shared.forget(&threat.path);
                    events.log(
                        LogLevel::Info,
                        &format!("Deleted: {} - {}", label, threat.name),
                    );
                    events.status_changed(&threat.id, FileStatus::Deleted, None);
                }
                Err(e) => {
                    failed += 1;
                    events.log(
                        LogLevel::Error,
                        &format!(
                            "Failed to delete {} ({}): {}",
                            threat.name,
                            e.remediation_failure(),
                            e
                        ),
                    );
                }
            }
        }

        let mut message = format!(
            "Cleared {} threat(s), killed {} process(es)",
            deleted, processes_killed
        );
        if failed > 0 {
            message.push_str(&format!(", {} failed", failed));
        }
        events.log(LogLevel::Info, &message);

        ClearResult {
            success: true,
            deleted,
            processes_killed,
            failed,
            message,
        }
    }

    /// Kill any correlated processes and move the file into quarantine.
    pub async fn quarantine_file(&self, path: &Path) -> QuarantineResult {
        let _guard = match self.begin_remediation() {
            Ok(guard) => guard,
            Err(e) => {
                return QuarantineResult {
                    success: false,
                    quarantine_path: None,
                    message: e.to_string(),
                }
            }
        };

        let pids = self.shared.matches.pids(path);
        self.remediator.terminate_all(&pids).await;
        self.remediator.release_pause().await;

        match self.remediator.quarantine(path) {
            Ok(dest) => {
                let file_name = display_name(path);
                if let Some(record) = self.shared.forget(path) {
                    self.shared
                        .events
                        .status_changed(&record.id, FileStatus::Quarantined, None);
                }
                self.shared
                    .events
                    .log(LogLevel::Info, &format!("Quarantined: {}", file_name));
                QuarantineResult {
                    success: true,
                    quarantine_path: Some(dest),
                    message: "File moved to quarantine".to_string(),
                }
            }
            Err(e) => {
                let message = format!("Failed to quarantine ({}): {}", e.remediation_failure(), e);
                self.shared.events.log(LogLevel::Error, &message);
                QuarantineResult {
                    success: false,
                    quarantine_path: None,
                    message,
                }
            }
        }
    }

    /// Kill any correlated processes and delete the file.
    pub async fn delete_file(&self, path: &Path) -> DeleteResult {
        let _guard = match self.begin_remediation() {
            Ok(guard) => guard,
            Err(e) => {
                return DeleteResult {
                    success: false,
                    failure: None,
                    message: e.to_string(),
                }
            }
        };

        let pids = self.shared.matches.pids(path);
        self.remediator.terminate_all(&pids).await;
        self.remediator.release_pause().await;

        match self.remediator.delete(path) {
            Ok(()) => {
                if let Some(record) = self.shared.forget(path) {
                    self.shared
                        .events
                        .status_changed(&record.id, FileStatus::Deleted, None);
                }
                self.shared
                    .events
                    .log(LogLevel::Info, &format!("Deleted: {}", display_name(path)));
                DeleteResult {
                    success: true,
                    failure: None,
                    message: "File deleted successfully".to_string(),
                }
            }
            Err(e) => {
                let failure = e.remediation_failure();
                self.shared.events.log(
                    LogLevel::Error,
                    &format!("Failed to delete {}: {}", path.display(), e),
                );
                DeleteResult::failed(failure)
            }
        }
    }

    /// Forget all results and reset the counters.
    pub fn clear_list(&self) -> ControlResult {
        let _guard = match self.begin_remediation() {
            Ok(guard) => guard,
            Err(e) => return ControlResult::failed(e.to_string()),
        };

        lock(&self.shared.threats).clear();
        self.shared.matches.clear();
        *lock(&self.shared.stats) = ScanStats::default();

        self.shared.events.stats(0, 0, 0);
        self.shared.events.log(LogLevel::Info, "Results cleared");
        ControlResult::ok("List cleared")
    }

    /// Snapshot of the results merged with caller metadata.
    pub fn build_report(&self, extra: serde_json::Map<String, serde_json::Value>) -> Result<serde_json::Value> {
        let threats = self.threats();
        report::build_report(
            extra,
            ReportInput {
                threats: &threats,
                scan_directories: &self.shared.full_targets,
                signatures: self.signatures(),
                stats: self.stats(),
            },
        )
    }

    /// Build a report and write it to `path`.
    pub fn export_report(
        &self,
        extra: serde_json::Map<String, serde_json::Value>,
        path: &Path,
    ) -> ExportResult {
        let written = self
            .build_report(extra)
            .and_then(|report| report::write_report(&report, path));

        match written {
            Ok(()) => {
                self.shared
                    .events
                    .log(LogLevel::Info, &format!("Report exported to: {}", path.display()));
                ExportResult {
                    success: true,
                    path: Some(PathBuf::from(path)),
                    message: None,
                }
            }
            Err(e) => {
                let message = format!("Failed to export: {}", e);
                self.shared.events.log(LogLevel::Error, &message);
                ExportResult {
                    success: false,
                    path: None,
                    message: Some(message),
                }
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RemediationFailure;
    use crate::scanner::archive::tests::build_zip;
    use crate::scanner::archive::MANIFEST_ENTRY;
    use crate::scanner::process::correlate::tests::FakeProcesses;
    use crate::scanner::process::ProcessInfo;
    use std::fs;
    use std::sync::mpsc;

    #[derive(Default)]
    struct RecordingSink {
        added: Mutex<Vec<FileRecord>>,
        statuses: Mutex<Vec<(String, FileStatus)>>,
        logs: Mutex<Vec<(LogLevel, String)>>,
        stats: Mutex<Vec<(u64, u64, u64)>>,
        completions: Mutex<u32>,
    }

    impl ProgressSink for RecordingSink {
        fn on_log(&self, level: LogLevel, message: &str) {
            self.logs.lock().unwrap().push((level, message.to_string()));
        }
        fn on_stats_updated(&self, scanned: u64, threats: u64, clean: u64) {
            assert_eq!(scanned, threats + clean);
            self.stats.lock().unwrap().push((scanned, threats, clean));
        }
        fn on_file_added(&self, record: &FileRecord) {
            self.added.lock().unwrap().push(record.clone());
        }
        fn on_file_status_changed(&self, id: &str, status: FileStatus, _: Option<&FileRecord>) {
            self.statuses.lock().unwrap().push((id.to_string(), status));
        }
        fn on_scan_complete(&self) {
            *self.completions.lock().unwrap() += 1;
        }
    }

    fn test_config(vault: &Path) -> Config {
        let mut config = Config::default();
        config.remediation.release_pause_ms = 0;
        config.remediation.kill_timeout_secs = 1;
        config.quarantine.vault_path = Some(vault.to_path_buf());
        config
    }

    fn engine_with(
        root: &Path,
        sink: Arc<RecordingSink>,
        processes: FakeProcesses,
    ) -> ScanEngine {
        ScanEngine::builder(test_config(&root.join("vault")))
            .sink(sink)
            .process_source(Arc::new(processes))
            .targets(vec![ScanTarget::new(root)], vec![])
            .build()
    }

    async fn scan_dir(engine: &ScanEngine, dir: &Path) {
        let started = engine.start_scan(ScanMode::Custom(vec![dir.to_path_buf()]));
        assert!(started.success, "{}", started.message);
        engine.wait().await.unwrap();
        assert_eq!(engine.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn test_scan_mixed_directory() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        fs::write(files.join("liquidbounce-1.8.9.jar"), b"jar").unwrap();
        fs::write(files.join("readme.txt"), b"text").unwrap();
        fs::write(files.join("notepad.exe"), b"MZ").unwrap();

        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(dir.path(), sink.clone(), FakeProcesses::default());
        scan_dir(&engine, &files).await;

        let stats = engine.stats();
        assert_eq!((stats.scanned, stats.threats, stats.clean), (2, 1, 1));
        let threats = engine.threats();
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].threat_name.as_deref(), Some("LiquidBounce"));
        assert!((2..=3).contains(&threats[0].threat_level));
        assert!(!threats[0].is_running);

        assert_eq!(sink.added.lock().unwrap().len(), 1);
        assert_eq!(
            sink.statuses.lock().unwrap().as_slice(),
            &[(threats[0].id.clone(), FileStatus::Threat)]
        );
        assert_eq!(*sink.completions.lock().unwrap(), 1);
        assert_eq!(sink.stats.lock().unwrap().last(), Some(&(2, 1, 1)));
    }

    #[tokio::test]
    async fn test_manifest_fallback_detects_threat() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        fs::write(
            files.join("tool.jar"),
            build_zip(&[(MANIFEST_ENTRY, b"Main-Class: dev.sigma.Main\n")]),
        )
        .unwrap();

        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        scan_dir(&engine, &files).await;

        let threats = engine.threats();
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].threat_name.as_deref(), Some("Sigma"));
    }

    #[tokio::test]
    async fn test_running_threat_is_correlated() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        let jar = files.join("wurst-7.jar");
        fs::write(&jar, b"jar").unwrap();

        let processes = FakeProcesses::with(vec![
            ProcessInfo::new(41, "java").with_args(["java", "-jar", "wurst-7.jar"]),
            ProcessInfo::new(42, "java").with_args(["java", "-jar", "other.jar"]),
        ]);
        let engine = engine_with(dir.path(), Arc::default(), processes);
        scan_dir(&engine, &files).await;

        assert!(engine.threats()[0].is_running);
        assert_eq!(engine.matched_pids(&jar), vec![41]);

        let result = engine.clear_threats().await;
        assert!(result.success);
        assert_eq!((result.deleted, result.processes_killed, result.failed), (1, 1, 0));
        assert!(!jar.exists());
        assert!(engine.matched_pids(&jar).is_empty());
        assert!(engine.threats().is_empty());
    }

    #[tokio::test]
    async fn test_clear_threats_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        let result = engine.clear_threats().await;
        assert!(!result.success);
        assert_eq!(result.message, "No threats to clear");
    }

    #[tokio::test]
    async fn test_clear_threats_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        for name in ["vape.jar", "flux.jar", "rise.exe"] {
            fs::write(files.join(name), b"x").unwrap();
        }

        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        scan_dir(&engine, &files).await;
        assert_eq!(engine.threats().len(), 3);

        // Vanishes between scan and remediation.
        fs::remove_file(files.join("flux.jar")).unwrap();

        let result = engine.clear_threats().await;
        assert!(result.success);
        assert_eq!(result.deleted, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.deleted + result.failed, 3);
        assert!(result.message.contains("1 failed"));

        let remaining = engine.threats();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "flux.jar");
        assert_eq!(engine.stats().threats, 3);
    }

    #[tokio::test]
    async fn test_quarantine_moves_listed_threat() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        let jar = files.join("meteor-client.jar");
        fs::write(&jar, b"meteor bytes").unwrap();

        let sink = Arc::new(RecordingSink::default());
        let engine = engine_with(dir.path(), sink.clone(), FakeProcesses::default());
        scan_dir(&engine, &files).await;
        let id = engine.threats()[0].id.clone();

        let result = engine.quarantine_file(&jar).await;
        assert!(result.success, "{}", result.message);
        let dest = result.quarantine_path.unwrap();
        assert!(!jar.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"meteor bytes");
        assert!(dest.starts_with(dir.path().join("vault")));
        assert!(engine.threats().is_empty());
        assert!(sink
            .statuses
            .lock()
            .unwrap()
            .contains(&(id, FileStatus::Quarantined)));
    }

    #[tokio::test]
    async fn test_quarantine_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        let result = engine.quarantine_file(&dir.path().join("ghost.jar")).await;
        assert!(!result.success);
        assert!(result.quarantine_path.is_none());
        assert!(result.message.contains("not found"));
    }

    #[tokio::test]
    async fn test_delete_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        let result = engine.delete_file(&dir.path().join("ghost.exe")).await;
        assert!(!result.success);
        assert_eq!(result.failure, Some(RemediationFailure::NotFound));
        assert_eq!(result.message, "not found");
    }

    #[tokio::test]
    async fn test_delete_file_success() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("anything.exe");
        fs::write(&file, b"MZ").unwrap();

        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        let result = engine.delete_file(&file).await;
        assert!(result.success);
        assert!(result.failure.is_none());
        assert!(!file.exists());
    }

    /// Blocks the scan task inside the first progress event until released.
    struct GateSink {
        reached: Mutex<Option<mpsc::Sender<()>>>,
        release: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl ProgressSink for GateSink {
        fn on_progress(&self, _percent: f64, _current_file: &str) {
            if let Some(reached) = self.reached.lock().unwrap().take() {
                reached.send(()).unwrap();
                if let Some(release) = self.release.lock().unwrap().take() {
                    release.recv().unwrap();
                }
            }
        }
    }

    #[tokio::test]
    async fn test_stop_scan_halts_at_file_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        for i in 0..50 {
            fs::write(files.join(format!("mod{}.jar", i)), b"x").unwrap();
        }

        let (reached_tx, reached_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let sink = Arc::new(GateSink {
            reached: Mutex::new(Some(reached_tx)),
            release: Mutex::new(Some(release_rx)),
        });

        let mut config = test_config(&dir.path().join("vault"));
        config.scan.progress_every_files = 1;
        let engine = ScanEngine::builder(config)
            .sink(sink)
            .process_source(Arc::new(FakeProcesses::default()))
            .targets(vec![], vec![])
            .build();

        assert!(engine.start_scan(ScanMode::Custom(vec![files.clone()])).success);
        assert!(!engine.start_scan(ScanMode::Full).success);

        reached_rx.recv().unwrap();
        assert!(engine.stop_scan().success);
        assert_eq!(engine.state(), ScanState::Stopping);
        assert!(!engine.clear_list().success);
        release_tx.send(()).unwrap();

        engine.wait().await.unwrap();
        assert_eq!(engine.state(), ScanState::Idle);
        let stats = engine.stats();
        assert_eq!(stats.scanned, 1);
        assert_eq!(stats.scanned, stats.threats + stats.clean);
        assert!(!engine.stop_scan().success);
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        let result = engine.start_scan(ScanMode::Quick);
        assert!(!result.success);
        assert_eq!(engine.state(), ScanState::Idle);
    }

    #[tokio::test]
    async fn test_clear_list_resets_results() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        fs::write(files.join("impact.jar"), b"x").unwrap();

        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        scan_dir(&engine, &files).await;
        assert_eq!(engine.status().threat_count, 1);

        assert!(engine.clear_list().success);
        let status = engine.status();
        assert_eq!(status.threat_count, 0);
        assert_eq!(status.stats, ScanStats::default());
    }

    #[tokio::test]
    async fn test_export_report() {
        let dir = tempfile::tempdir().unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        fs::write(files.join("phobos.jar"), b"x").unwrap();

        let engine = engine_with(dir.path(), Arc::default(), FakeProcesses::default());
        scan_dir(&engine, &files).await;

        let mut extra = serde_json::Map::new();
        extra.insert("scanMode".to_string(), "custom".into());
        let out = dir.path().join("report.json");
        let result = engine.export_report(extra, &out);
        assert!(result.success);

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(report["scanMode"], "custom");
        assert_eq!(report["threats"][0]["threatName"], "Phobos");
        assert_eq!(report["stats"]["threats"], 1);
    }
}
