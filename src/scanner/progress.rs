//! Scan progress reporting.
//!
//! The engine talks to front ends only through [`ProgressSink`]. Delivery is
//! best effort: a sink that panics is contained by [`EventEmitter`] and the
//! scan carries on.

use crate::core::types::{FileRecord, FileStatus, LogLevel};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Receiver of engine events. Called from the scan task.
pub trait ProgressSink: Send + Sync {
    fn on_log(&self, _level: LogLevel, _message: &str) {}
    fn on_stats_updated(&self, _scanned: u64, _threats: u64, _clean: u64) {}
    fn on_progress(&self, _percent: f64, _current_file: &str) {}
    fn on_timer_tick(&self, _elapsed_secs: f64) {}
    fn on_file_added(&self, _record: &FileRecord) {}
    fn on_file_status_changed(&self, _id: &str, _status: FileStatus, _record: Option<&FileRecord>) {}
    fn on_scan_complete(&self) {}
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {}

/// Fans engine events into a sink, isolating its failures.
#[derive(Clone)]
pub struct EventEmitter {
    sink: Arc<dyn ProgressSink>,
}

impl EventEmitter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self { sink }
    }

    fn deliver(&self, event: &str, f: impl FnOnce(&dyn ProgressSink)) {
        if catch_unwind(AssertUnwindSafe(|| f(self.sink.as_ref()))).is_err() {
            log::error!("Progress sink panicked while handling {}", event);
        }
    }

    /// Log through the `log` facade and forward to the sink.
    pub fn log(&self, level: LogLevel, message: &str) {
        log::log!(level.as_log_level(), "{}", message);
        self.deliver("log", |s| s.on_log(level, message));
    }

    pub fn stats(&self, scanned: u64, threats: u64, clean: u64) {
        self.deliver("stats", |s| s.on_stats_updated(scanned, threats, clean));
    }

    pub fn progress(&self, percent: f64, current_file: &str) {
        self.deliver("progress", |s| s.on_progress(percent, current_file));
    }

    pub fn timer(&self, elapsed_secs: f64) {
        self.deliver("timer", |s| s.on_timer_tick(elapsed_secs));
    }

    pub fn file_added(&self, record: &FileRecord) {
        self.deliver("file added", |s| s.on_file_added(record));
    }

    pub fn status_changed(&self, id: &str, status: FileStatus, record: Option<&FileRecord>) {
        self.deliver("status change", |s| s.on_file_status_changed(id, status, record));
    }

    pub fn complete(&self) {
        self.deliver("completion", |s| s.on_scan_complete());
    }
}

/// Decides when a progress event is due: every N files or after an
/// interval, whichever comes first.
#[derive(Debug)]
pub struct ProgressThrottle {
    every_files: u64,
    interval: Duration,
    since_last: u64,
    last_emit: Instant,
}

impl ProgressThrottle {
    pub fn new(every_files: u64, interval: Duration) -> Self {
        Self {
            every_files: every_files.max(1),
            interval,
            since_last: 0,
            last_emit: Instant::now(),
        }
    }

    /// Record one processed file; returns true when an event should be sent.
    pub fn tick(&mut self) -> bool {
        self.since_last += 1;
        if self.since_last >= self.every_files || self.last_emit.elapsed() >= self.interval {
            self.since_last = 0;
            self.last_emit = Instant::now();
            true
        } else {
            false
        }
    }
}

/// Completion estimate for a walk of unknown size.
pub fn estimate_percent(scanned: u64) -> f64 {
    scanned as f64 / (scanned as f64 + 1000.0) * 100.0
}

/// Console progress reporter writing to stderr.
pub struct ConsoleProgressReporter {
    last_line_length: AtomicUsize,
    verbose: bool,
}

impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleProgressReporter {
    /// Create a new console reporter.
    pub fn new() -> Self {
        Self {
            last_line_length: AtomicUsize::new(0),
            verbose: false,
        }
    }

    /// Enable verbose output.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    fn print_line(&self, message: String) {
        // Clear previous line and print new one
        let last_len = self.last_line_length.load(Ordering::Relaxed);
        let padding = if message.len() < last_len {
            " ".repeat(last_len - message.len())
        } else {
            String::new()
        };

        eprint!("\r{}{}", message, padding);
        self.last_line_length.store(message.len(), Ordering::Relaxed);
    }

    fn break_line(&self) {
        if self.last_line_length.swap(0, Ordering::Relaxed) > 0 {
            eprintln!();
        }
    }
}

impl ProgressSink for ConsoleProgressReporter {
    fn on_log(&self, level: LogLevel, message: &str) {
        if self.verbose || level != LogLevel::Info {
            self.break_line();
            eprintln!("[{}] {}", level, message);
        }
    }

    fn on_progress(&self, percent: f64, current_file: &str) {
        let mut name = current_file.to_string();
        if name.len() > 48 {
            let cut = name
                .char_indices()
                .map(|(i, _)| i)
                .find(|i| *i >= name.len() - 45)
                .unwrap_or(0);
            name = format!("...{}", &name[cut..]);
        }
        self.print_line(format!("[Scanning] {:.1}% | {}", percent, name));
    }

    fn on_stats_updated(&self, scanned: u64, threats: u64, clean: u64) {
        if self.verbose {
            self.print_line(format!(
                "[Scanning] Files: {} | Threats: {} | Clean: {}",
                scanned, threats, clean
            ));
        }
    }

    fn on_file_added(&self, record: &FileRecord) {
        self.break_line();
        eprintln!(
            "  [!] Found: {} - {}{}",
            record.threat_name.as_deref().unwrap_or("Unknown"),
            record.path.display(),
            if record.is_running { " (running)" } else { "" }
        );
    }

    fn on_scan_complete(&self) {
        self.break_line();
    }
}
