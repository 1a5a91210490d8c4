//! cheatscan: find and remove game cheat clients.
//!
//! This is the main entry point for the CLI application.

use cheatscan::core::config::Config;
use cheatscan::core::error::{Error, Result};
use cheatscan::core::types::ScanMode;
use cheatscan::scanner::{ConsoleProgressReporter, ScanEngine};
use cheatscan::ui::cli::{Cli, Commands, ConfigAction, OutputFormat};
use cheatscan::utils::logging::{cleanup_old_logs, init_logging, LogConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.suggestion() {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::load_or_default();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::from_config(&config)
    };
    init_logging(log_config)?;

    log::info!("cheatscan v{}", env!("CARGO_PKG_VERSION"));
    config.validate()?;
    if let Err(e) = cleanup_old_logs(&config.logging.log_dir(), config.logging.keep_logs_days) {
        log::debug!("Log cleanup skipped: {}", e);
    }

    match cli.command {
        Some(Commands::Scan {
            quick,
            full,
            path,
            clean,
            output,
        }) => {
            let mode = Commands::scan_mode(quick, full, path);
            run_scan(config, mode, clean, output, cli.verbose, cli.format).await
        }
        Some(Commands::Quarantine { path }) => run_quarantine(config, &path, cli.format).await,
        Some(Commands::Delete { path }) => run_delete(config, &path, cli.format).await,
        Some(Commands::Signatures) => run_signatures(config, cli.format),
        Some(Commands::Config { action }) => run_config(action, &config),
        Some(Commands::Info) => run_info(&config),
        None => {
            println!("cheatscan - Game Cheat Client Scanner");
            println!();
            println!("Use --help for usage information");
            println!();
            println!("Quick start:");
            println!("  cheatscan scan --quick          Scan downloads and game folders");
            println!("  cheatscan scan --full           Scan every drive");
            println!("  cheatscan scan --quick --clean  Scan and remove what is found");
            println!("  cheatscan signatures            List known cheat clients");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a scan, optionally cleaning up and exporting afterwards.
async fn run_scan(
    config: Config,
    mode: ScanMode,
    clean: bool,
    output: Option<PathBuf>,
    verbose: bool,
    format: OutputFormat,
) -> Result<()> {
    let reporter = if verbose {
        ConsoleProgressReporter::new().verbose()
    } else {
        ConsoleProgressReporter::new()
    };
    let engine = ScanEngine::builder(config).sink(Arc::new(reporter)).build();

    let mode_name = mode.to_string();
    let started = engine.start_scan(mode);
    if !started.success {
        return Err(Error::Internal(started.message));
    }
    engine.wait().await?;

    let status = engine.status();
    let threats = engine.threats();

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": status,
            "threats": threats,
        }))?,
        OutputFormat::Text => {
            println!();
            println!("=== Scan Complete ===");
            println!("Files Scanned:   {}", status.stats.scanned);
            println!("Threats Found:   {}", status.stats.threats);
            println!("Clean:           {}", status.stats.clean);
            println!("Duration:        {:.1} seconds", status.elapsed_secs);
            for threat in &threats {
                println!(
                    "  [{}] {} - {}{}",
                    threat.threat_level,
                    threat.threat_name.as_deref().unwrap_or("Unknown"),
                    threat.path.display(),
                    if threat.is_running { " (running)" } else { "" }
                );
            }
        }
    }

    if let Some(path) = output {
        let mut extra = serde_json::Map::new();
        extra.insert("scan_mode".to_string(), serde_json::Value::String(mode_name));
        let exported = engine.export_report(extra, &path);
        if !exported.success {
            return Err(Error::Internal(exported.message.unwrap_or_default()));
        }
        println!("Report written to {}", path.display());
    }

    if clean && !threats.is_empty() {
        let result = engine.clear_threats().await;
        match format {
            OutputFormat::Json => print_json(&result)?,
            OutputFormat::Text => println!("{}", result.message),
        }
    }

    Ok(())
}

async fn run_quarantine(config: Config, path: &Path, format: OutputFormat) -> Result<()> {
    let engine = ScanEngine::new(config);
    let result = engine.quarantine_file(path).await;
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => match &result.quarantine_path {
            Some(dest) => println!("{}: {}", result.message, dest.display()),
            None => println!("{}", result.message),
        },
    }
    if result.success {
        Ok(())
    } else {
        Err(Error::QuarantineFailed {
            path: path.to_path_buf(),
            source: result.message.into(),
        })
    }
}

async fn run_delete(config: Config, path: &Path, format: OutputFormat) -> Result<()> {
    let engine = ScanEngine::new(config);
    let result = engine.delete_file(path).await;
    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => println!("{}", result.message),
    }
    if result.success {
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "Failed to delete {}: {}",
            path.display(),
            result.message
        )))
    }
}

fn run_signatures(config: Config, format: OutputFormat) -> Result<()> {
    let engine = ScanEngine::builder(config).targets(Vec::new(), Vec::new()).build();
    let signatures = engine.signatures();
    match format {
        OutputFormat::Json => print_json(&signatures.iter().collect::<Vec<_>>())?,
        OutputFormat::Text => {
            println!("{} known cheat clients:", signatures.len());
            for signature in signatures.iter() {
                println!("  {:<16} {}", signature.key, signature.display_name);
            }
        }
    }
    Ok(())
}

/// Handle configuration commands.
fn run_config(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => print_json(config)?,
        ConfigAction::Reset { yes } => {
            if !yes {
                println!("This will overwrite {}", Config::default_config_path().display());
                println!("Re-run with --yes to confirm.");
                return Ok(());
            }
            log::info!("Resetting configuration to defaults...");
            Config::default().save(&Config::default_config_path())?;
            println!("Configuration reset to defaults.");
        }
        ConfigAction::Path => {
            println!("{}", Config::default_config_path().display());
        }
    }
    Ok(())
}

/// Show application information.
fn run_info(config: &Config) -> Result<()> {
    println!("cheatscan - Game Cheat Client Scanner");
    println!();
    println!("Version:          {}", env!("CARGO_PKG_VERSION"));
    println!("Config Path:      {}", Config::default_config_path().display());
    println!("Data Directory:   {}", Config::data_dir().display());
    println!("Log Directory:    {}", config.logging.log_dir().display());
    println!("Quarantine Path:  {}", config.quarantine.quarantine_dir().display());
    println!();
    println!("Scan Settings:");
    println!("  Extensions:     {}", config.scan.monitored_extensions.join(", "));
    println!("  Scan Archives:  {}", config.scan.scan_archives);
    println!("  Kill Timeout:   {} s", config.remediation.kill_timeout_secs);
    println!("  Release Feed:   {}", config.updates.release_feed_url);
    Ok(())
}
