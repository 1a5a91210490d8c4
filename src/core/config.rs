//! Configuration management for cheatscan.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scan-related settings
    pub scan: ScanConfig,
    /// Process termination and file removal settings
    pub remediation: RemediationConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Quarantine settings
    pub quarantine: QuarantineConfig,
    /// Self-update settings
    pub updates: UpdateConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigSave(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| Error::ConfigSave(format!("Failed to write config file: {}", e)))
    }

    /// Load configuration from default location, or create default if not exists.
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    log::warn!("Failed to load config, using defaults: {}", e);
                }
            }
        }

        let config = Self::default();

        if let Err(e) = config.save(&config_path) {
            log::warn!("Failed to save default config: {}", e);
        }

        config
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        Self::data_dir().join("config.json")
    }

    /// Get the application data directory.
    pub fn data_dir() -> PathBuf {
        #[cfg(windows)]
        {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData"))
                .join("cheatscan")
        }

        #[cfg(not(windows))]
        {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("cheatscan")
        }
    }

    /// Per-user root for quarantined files and other persisted artifacts.
    pub fn user_root() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(Self::data_dir)
            .join(".cheatscan")
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.scan.monitored_extensions.is_empty() {
            return Err(Error::ConfigInvalid {
                field: "scan.monitored_extensions".to_string(),
                message: "At least one extension must be monitored".to_string(),
            });
        }

        if self.scan.hash_prefix_bytes == 0 {
            return Err(Error::ConfigInvalid {
                field: "scan.hash_prefix_bytes".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.scan.progress_every_files == 0 {
            return Err(Error::ConfigInvalid {
                field: "scan.progress_every_files".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.remediation.kill_timeout_secs == 0 || self.remediation.kill_timeout_secs > 60 {
            return Err(Error::ConfigInvalid {
                field: "remediation.kill_timeout_secs".to_string(),
                message: "Must be between 1 and 60".to_string(),
            });
        }

        if self.logging.keep_logs_days == 0 {
            return Err(Error::ConfigInvalid {
                field: "logging.keep_logs_days".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Scan-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extensions (lowercase, no dot) eligible for classification
    pub monitored_extensions: Vec<String>,
    /// Extensions opened as zip containers for the content scan
    pub archive_extensions: Vec<String>,
    /// Whether to look inside archives when the name does not match
    pub scan_archives: bool,
    /// Largest manifest entry read from an archive, in bytes
    pub max_manifest_bytes: u64,
    /// Directories pruned from the walk. Absolute markers prune that path
    /// and everything below it; relative markers prune any directory whose
    /// path contains them.
    pub skip_markers: Vec<String>,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Bytes hashed from the start of each candidate
    pub hash_prefix_bytes: u64,
    /// Emit progress after this many files
    pub progress_every_files: u64,
    /// Emit progress after this much time regardless of file count
    pub progress_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            monitored_extensions: vec!["jar".to_string(), "exe".to_string()],
            archive_extensions: vec!["jar".to_string(), "zip".to_string()],
            scan_archives: true,
            max_manifest_bytes: 1024 * 1024,
            skip_markers: default_skip_markers(),
            follow_symlinks: false,
            hash_prefix_bytes: 1024 * 1024,
            progress_every_files: 100,
            progress_interval_ms: 1000,
        }
    }
}

impl ScanConfig {
    /// Whether `ext` (any case, no dot) is in the monitored set.
    pub fn is_monitored_extension(&self, ext: &str) -> bool {
        self.monitored_extensions
            .iter()
            .any(|m| m.eq_ignore_ascii_case(ext))
    }

    /// Whether `ext` (any case, no dot) names a zip container.
    pub fn is_archive_extension(&self, ext: &str) -> bool {
        self.archive_extensions
            .iter()
            .any(|m| m.eq_ignore_ascii_case(ext))
    }
}

#[cfg(windows)]
fn default_skip_markers() -> Vec<String> {
    [
        "Windows",
        "WinSxS",
        "$Recycle.Bin",
        "System Volume Information",
        "ProgramData",
        "AppData\\Local\\Temp",
        "node_modules",
        ".git",
        "Program Files\\Windows",
        "Program Files (x86)\\Windows",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(not(windows))]
fn default_skip_markers() -> Vec<String> {
    [
        "/proc",
        "/sys",
        "/dev",
        "/run",
        "/var/cache",
        "/var/lib/docker",
        ".Trash",
        "node_modules",
        ".git",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Process termination and file removal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    /// How long to wait for a killed process to exit
    pub kill_timeout_secs: u64,
    /// Pause between killing processes and touching their files
    pub release_pause_ms: u64,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            kill_timeout_secs: 5,
            release_pause_ms: 500,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Days to keep log files
    pub keep_logs_days: u32,
    /// Path for log files
    pub log_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            keep_logs_days: 30,
            log_path: None,
        }
    }
}

impl LoggingConfig {
    /// Get the effective log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("logs"))
    }
}

/// Quarantine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarantineConfig {
    /// Override for the quarantine directory
    pub vault_path: Option<PathBuf>,
}

impl QuarantineConfig {
    /// Get the effective quarantine directory.
    pub fn quarantine_dir(&self) -> PathBuf {
        self.vault_path
            .clone()
            .unwrap_or_else(|| Config::user_root().join("quarantine"))
    }
}

/// Self-update configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Version compared against the release feed
    pub current_version: String,
    /// Release feed queried by the updater
    pub release_feed_url: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            release_feed_url: "https://api.github.com/repos/cheatscan/cheatscan/releases/latest"
                .to_string(),
        }
    }
}
