//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Instagram business account source
#[derive(Parser, Debug)]
#[command(name = "source-instagram")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON, takes precedence over --config
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON, takes precedence over --state
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify the token by listing the reachable business accounts
    Check,

    /// Print the catalog of available streams
    Discover,

    /// Read selected streams and print Singer messages
    Read {
        /// Catalog file; every stream is read when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Write the final state to this file
        #[arg(long)]
        state_output: Option<PathBuf>,
    },
}

impl Commands {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Discover => "discover",
            Self::Read { .. } => "read",
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
