//! CLI module
//!
//! Provides the command-line interface:
//! - init: write a default config file and create the data directory
//! - start: load the snapshot and enter the serving loop

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run_command, start, ServerConfig};
pub use errors::{CliError, CliResult};

/// Parse arguments and dispatch.
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}
