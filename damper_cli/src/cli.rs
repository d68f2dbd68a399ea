//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "damper", version, about = "Vibration damper control loop")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/damper.toml")]
    pub config: PathBuf,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the acquisition and actuation loop until Ctrl-C or the duration ends
    Run {
        /// Stop on its own after this many seconds
        #[arg(long, value_name = "SECS")]
        duration_s: Option<f64>,
        /// Print per-task counters and sample rate on completion
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Load config, profile and model and check that their dimensions agree
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Run { .. } => "run",
            Commands::SelfCheck => "self-check",
            Commands::Health => "health",
        }
    }
}
