//! HTTP server
//!
//! Combines the admin (console) and client (runtime) routers behind one
//! listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::observability::Logger;
use crate::service::ConfigService;

use super::admin_routes::{admin_routes, AdminState};
use super::client_routes::{client_routes, ClientState};
use super::config::HttpServerConfig;

/// HTTP server for the configuration store
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server with default configuration
    pub fn new(service: Arc<ConfigService>) -> Self {
        Self::with_config(service, HttpServerConfig::default())
    }

    /// Create a server with custom configuration
    pub fn with_config(service: Arc<ConfigService>, config: HttpServerConfig) -> Self {
        let router = Self::build_router(service, &config);
        Self { config, router }
    }

    /// Build the combined router
    fn build_router(service: Arc<ConfigService>, config: &HttpServerConfig) -> Router {
        let admin_state = Arc::new(AdminState {
            service: service.clone(),
        });
        let client_state = Arc::new(ClientState {
            service,
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
        });

        let cors = if config.cors_origins.is_empty() {
            // Permissive for development when no origins are configured.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/health", get(health_handler))
            .nest("/admin", admin_routes(admin_state))
            .nest("/api/v1", client_routes(client_state))
            .layer(cors)
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start serving (runs until the process exits)
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address: {}", e),
            )
        })?;

        Logger::info("SERVER_STARTED", &[("addr", &addr.to_string())]);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "time": chrono::Utc::now().timestamp(),
    }))
}
