//! CLI argument definitions for tailwatchd.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Log file discovery and tailing daemon.
///
/// Periodically discovers files matching the configured regex/glob patterns,
/// follows them from their end, and writes every new line to stdout.
#[derive(Parser, Debug)]
#[command(name = "tailwatchd")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to tailwatch.toml configuration file.
    #[arg(short, long, default_value = "/etc/tailwatch/tailwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Format of tailed lines written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

/// Output format for tailed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `<path>\t<line>`
    Text,
    /// One JSON object per line: `{"path": ..., "line": ...}`
    Json,
}
