//! CLI error types

use thiserror::Error;

use crate::snapshot::SnapshotError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}
