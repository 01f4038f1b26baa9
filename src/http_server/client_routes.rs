//! Client HTTP routes
//!
//! The runtime surface for config-consuming services: immediate resolution
//! and long-polling. Both evaluate gray routing per client, so two clients
//! of the same key may legitimately receive different values.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::gray::Resolved;
use crate::service::ConfigService;

use super::errors::ApiResult;

/// Shared state for client handlers
pub struct ClientState {
    pub service: Arc<ConfigService>,
    /// How long a poll with a current fingerprint is held open
    pub poll_timeout: Duration,
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub namespace: String,
    pub key: String,
    pub client_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PollRequest {
    pub namespace: String,
    pub key: String,
    pub client_id: String,
    /// The fingerprint of the value the client currently holds
    #[serde(default)]
    pub fingerprint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Resolved>,
}

// ==================
// Routes
// ==================

/// Create client routes
pub fn client_routes(state: Arc<ClientState>) -> Router {
    Router::new()
        .route("/config/get", post(resolve_handler))
        .route("/config/poll", post(poll_handler))
        .with_state(state)
}

async fn resolve_handler(
    State(state): State<Arc<ClientState>>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Json<Resolved>> {
    let resolved =
        state
            .service
            .resolve(&request.namespace, &request.key, &request.client_id)?;
    Ok(Json(resolved))
}

async fn poll_handler(
    State(state): State<Arc<ClientState>>,
    Json(request): Json<PollRequest>,
) -> ApiResult<Json<PollResponse>> {
    let outcome = state
        .service
        .poll(
            &request.namespace,
            &request.key,
            &request.client_id,
            request.fingerprint.as_deref(),
            state.poll_timeout,
        )
        .await?;
    Ok(Json(PollResponse {
        changed: outcome.is_some(),
        version: outcome,
    }))
}
