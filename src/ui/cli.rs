//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::ScanMode;

/// cheatscan: find and remove game cheat clients
#[derive(Parser, Debug)]
#[command(name = "cheatscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine processing
    Json,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan for cheat clients
    Scan {
        /// Scan download, desktop and game folders only
        #[arg(short, long, conflicts_with_all = ["full", "path"])]
        quick: bool,

        /// Scan every mounted volume
        #[arg(short, long, conflicts_with_all = ["quick", "path"])]
        full: bool,

        /// Scan specific path(s)
        #[arg(short, long, num_args = 1.., conflicts_with_all = ["quick", "full"])]
        path: Option<Vec<PathBuf>>,

        /// Kill and delete every threat found
        #[arg(long)]
        clean: bool,

        /// Write a JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Kill processes running a file and move it into quarantine
    Quarantine {
        /// File to quarantine
        path: PathBuf,
    },

    /// Kill processes running a file and delete it
    Delete {
        /// File to delete
        path: PathBuf,
    },

    /// List known cheat clients
    Signatures,

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show application information
    Info,
}

impl Commands {
    /// Scan mode selected by the scan flags. Quick is the default.
    pub fn scan_mode(quick: bool, full: bool, path: Option<Vec<PathBuf>>) -> ScanMode {
        match (quick, full, path) {
            (_, _, Some(paths)) if !paths.is_empty() => ScanMode::Custom(paths),
            (_, true, _) => ScanMode::Full,
            _ => ScanMode::Quick,
        }
    }
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Print configuration file location
    Path,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_paths() {
        let cli = Cli::try_parse_from([
            "cheatscan", "scan", "--path", "/mods", "/downloads", "--clean", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);

        match cli.command {
            Some(Commands::Scan {
                quick,
                full,
                path,
                clean,
                output,
            }) => {
                assert!(clean);
                assert!(output.is_none());
                assert_eq!(
                    Commands::scan_mode(quick, full, path),
                    ScanMode::Custom(vec![PathBuf::from("/mods"), PathBuf::from("/downloads")])
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_scan_flags() {
        assert!(Cli::try_parse_from(["cheatscan", "scan", "--quick", "--full"]).is_err());
    }

    #[test]
    fn test_default_scan_mode() {
        assert_eq!(Commands::scan_mode(false, false, None), ScanMode::Quick);
        assert_eq!(Commands::scan_mode(false, true, None), ScanMode::Full);
    }

    #[test]
    fn test_parse_delete() {
        let cli = Cli::try_parse_from(["cheatscan", "-v", "delete", "vape.jar"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Delete { path }) if path == PathBuf::from("vape.jar")));
    }
}
