//! Logging infrastructure for cheatscan.

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level
    pub level: LevelFilter,
    /// Show timestamps
    pub timestamps: bool,
    /// Show module path
    pub module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            timestamps: true,
            module_path: false,
        }
    }
}

impl LogConfig {
    /// Create a log config from application config.
    pub fn from_config(config: &Config) -> Self {
        let level = parse_level(&config.logging.log_level);

        Self {
            level,
            timestamps: true,
            module_path: level >= LevelFilter::Debug,
        }
    }

    /// Create a verbose log config for CLI.
    pub fn verbose() -> Self {
        Self {
            level: LevelFilter::Debug,
            timestamps: true,
            module_path: true,
        }
    }

    /// Create a quiet log config (errors only).
    pub fn quiet() -> Self {
        Self {
            level: LevelFilter::Error,
            timestamps: false,
            module_path: false,
        }
    }
}

fn parse_level(name: &str) -> LevelFilter {
    match name.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" | "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Environment variable holding `env_logger` filter directives.
pub const LOG_ENV: &str = "CHEATSCAN_LOG";

/// Install the global logger.
///
/// Directives in [`LOG_ENV`] override the configured level per module.
pub fn init_logging(config: LogConfig) -> Result<()> {
    let LogConfig {
        level,
        timestamps,
        module_path,
    } = config;

    let mut builder = Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var(LOG_ENV) {
        builder.parse_filters(&filters);
    }

    builder.format(move |buf, record| {
        if timestamps {
            write!(buf, "{} ", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        }
        let style = buf.default_level_style(record.level());
        write!(buf, "[{style}{:<5}{style:#}] ", record.level())?;
        if module_path {
            if let Some(path) = record.module_path() {
                write!(buf, "{}: ", path)?;
            }
        }
        writeln!(buf, "{}", record.args())
    });

    builder
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logger: {}", e)))?;

    log::debug!("Logging initialized at {:?}", level);
    Ok(())
}

/// Clean up old log files.
pub fn cleanup_old_logs(log_dir: &Path, keep_days: u32) -> Result<u32> {
    use std::time::{Duration, SystemTime};

    // A retention longer than the clock can express keeps everything.
    let retention = Duration::from_secs(u64::from(keep_days) * 24 * 60 * 60);
    let Some(cutoff) = SystemTime::now().checked_sub(retention) else {
        return Ok(0);
    };
    let mut deleted = 0u32;

    if !log_dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(log_dir).map_err(|e| Error::DirectoryAccess {
        path: log_dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();

        if path.extension().is_some_and(|ext| ext == "log") {
            if let Ok(metadata) = entry.metadata() {
                if let Ok(modified) = metadata.modified() {
                    if modified < cutoff && fs::remove_file(&path).is_ok() {
                        log::debug!("Deleted old log file: {:?}", path);
                        deleted += 1;
                    }
                }
            }
        }
    }

    if deleted > 0 {
        log::info!("Cleaned up {} old log file(s)", deleted);
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, LevelFilter::Info);
        assert!(config.timestamps);
    }

    #[test]
    fn test_log_config_verbose() {
        let config = LogConfig::verbose();
        assert_eq!(config.level, LevelFilter::Debug);
        assert!(config.module_path);
    }

    #[test]
    fn test_log_config_quiet() {
        let config = LogConfig::quiet();
        assert_eq!(config.level, LevelFilter::Error);
        assert!(!config.timestamps);
    }

    #[test]
    fn test_log_config_from_config() {
        let mut config = Config::default();
        config.logging.log_level = "WARNING".to_string();
        assert_eq!(LogConfig::from_config(&config).level, LevelFilter::Warn);

        config.logging.log_level = "nonsense".to_string();
        assert_eq!(LogConfig::from_config(&config).level, LevelFilter::Info);
    }

    #[test]
    fn test_cleanup_keeps_fresh_logs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("today.log"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(cleanup_old_logs(dir.path(), 1).unwrap(), 0);
        assert!(dir.path().join("today.log").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cleanup_old_logs(&dir.path().join("nope"), 1).unwrap(), 0);
    }

    #[test]
    fn test_cleanup_with_unbounded_retention() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("today.log");
        fs::write(&log, "entry").unwrap();

        assert_eq!(cleanup_old_logs(dir.path(), u32::MAX).unwrap(), 0);
        assert!(log.exists());
    }
}
