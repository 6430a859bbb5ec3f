//! CLI module
//!
//! Command-line interface for running the source.
//!
//! # Commands
//!
//! - `check` - Verify the token and list reachable accounts
//! - `discover` - Print the stream catalog
//! - `read` - Extract data from the selected streams

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
