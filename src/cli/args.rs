//! CLI argument definitions using clap
//!
//! Commands:
//! - graydb init --config <path>
//! - graydb start --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// graydb - a versioned configuration store with gray-release routing
#[derive(Parser, Debug)]
#[command(name = "graydb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file and create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./graydb.json")]
        config: PathBuf,
    },

    /// Start the graydb server
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./graydb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
