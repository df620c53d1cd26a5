//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "helium", version, about = "Helium level monitor")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/helium_config.toml")]
    pub config: PathBuf,

    /// Optional calibration CSV (strict header), replaces the configured table
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log and print as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitor until Ctrl-C (or for a fixed time)
    Run {
        /// Enable notifications for this recipient (repeatable); messages go to stdout
        #[arg(long = "subscribe", value_name = "ID")]
        subscribe: Vec<String>,
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long = "run-for-s", value_name = "SECS")]
        run_for_s: Option<f64>,
    },
    /// Take one reading and print it
    Status,
    /// Quick health check (config, calibration, one sensor read)
    SelfCheck,
}
