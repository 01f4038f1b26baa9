//! CLI command implementations

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::Logger;
use crate::service::ConfigService;
use crate::snapshot;

use super::args::{Cli, Command};
use super::errors::CliResult;

/// Snapshot file name within the data directory
const SNAPSHOT_FILE: &str = "graydb.snapshot.json";

/// Top-level server configuration, loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Directory holding the snapshot file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HTTP server settings
    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./graydb-data")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            http: HttpServerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> CliResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}

/// Dispatch a parsed CLI invocation
pub fn run_command(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Init { config } => init(&config),
        Command::Start { config } => start(&config),
    }
}

/// Write a default config file and create the data directory.
///
/// An existing config file is left untouched.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = if config_path.exists() {
        ServerConfig::load(config_path)?
    } else {
        let config = ServerConfig::default();
        fs::write(config_path, serde_json::to_string_pretty(&config)?)?;
        config
    };
    fs::create_dir_all(&config.data_dir)?;
    Logger::info(
        "INIT_COMPLETE",
        &[
            ("config", &config_path.display().to_string()),
            ("data_dir", &config.data_dir.display().to_string()),
        ],
    );
    Ok(())
}

/// Load the snapshot (when one exists) and serve HTTP until terminated.
pub fn start(config_path: &Path) -> CliResult<()> {
    let config = if config_path.exists() {
        ServerConfig::load(config_path)?
    } else {
        ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let snapshot_path = config.snapshot_path();
    let service = if snapshot_path.exists() {
        let state = snapshot::load_snapshot(&snapshot_path)?;
        Logger::info(
            "SNAPSHOT_LOADED",
            &[
                ("path", &snapshot_path.display().to_string()),
                ("namespaces", &state.namespaces.len().to_string()),
                ("items", &state.items.len().to_string()),
            ],
        );
        ConfigService::from_state(state)
    } else {
        ConfigService::new()
    };
    let service = Arc::new(service.with_snapshot_path(snapshot_path));

    let server = HttpServer::with_config(service, config.http);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.start())?;
    Ok(())
}
