//! Admin HTTP routes
//!
//! The console surface: namespace management, draft editing, publishing and
//! gray rule management. Handlers are thin; all semantics live in
//! [`ConfigService`].

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::gray::GrayRule;
use crate::service::ConfigService;
use crate::store::{ConfigFormat, ConfigItemSummary, ConfigVersion, Namespace, StoreError};

use super::errors::ApiResult;

/// Shared state for admin handlers
pub struct AdminState {
    pub service: Arc<ConfigService>,
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct CreateNamespaceRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    pub namespace: String,
    pub key: String,
    pub format: ConfigFormat,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub namespace: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveGrayRuleRequest {
    pub namespace: String,
    pub key: String,
    pub percentage: i64,
    pub enabled: bool,
}

/// Query params addressing one config item or rule
#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub namespace: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ==================
// Routes
// ==================

/// Create admin routes
pub fn admin_routes(state: Arc<AdminState>) -> Router {
    Router::new()
        // Namespaces
        .route("/namespaces", get(list_namespaces_handler))
        .route("/namespaces", post(create_namespace_handler))
        .route("/namespaces/:id", get(get_namespace_handler))
        .route("/namespaces/:id", delete(delete_namespace_handler))
        .route("/namespaces/:id/configs", get(list_configs_handler))
        .route("/namespaces/:id/gray-rules", get(list_gray_rules_handler))
        // Config items
        .route("/configs/draft", post(save_draft_handler))
        .route("/configs/draft", get(get_draft_handler))
        .route("/configs/publish", post(publish_handler))
        .route("/configs/published", get(get_published_handler))
        .route("/configs", delete(delete_config_handler))
        // Gray rules
        .route("/gray-rules", post(save_gray_rule_handler))
        .route("/gray-rules", get(get_gray_rule_handler))
        .route("/gray-rules", delete(delete_gray_rule_handler))
        .with_state(state)
}

// ==================
// Namespace Handlers
// ==================

async fn list_namespaces_handler(
    State(state): State<Arc<AdminState>>,
) -> ApiResult<Json<Vec<Namespace>>> {
    Ok(Json(state.service.list_namespaces()?))
}

async fn create_namespace_handler(
    State(state): State<Arc<AdminState>>,
    Json(request): Json<CreateNamespaceRequest>,
) -> ApiResult<Json<Namespace>> {
    let ns = state
        .service
        .create_namespace(&request.id, &request.name, &request.description)?;
    Ok(Json(ns))
}

async fn get_namespace_handler(
    State(state): State<Arc<AdminState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Namespace>> {
    Ok(Json(state.service.get_namespace(&id)?))
}

async fn delete_namespace_handler(
    State(state): State<Arc<AdminState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.service.delete_namespace(&id)?;
    Ok(Json(MessageResponse {
        message: format!("namespace '{}' deleted", id),
    }))
}

async fn list_configs_handler(
    State(state): State<Arc<AdminState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ConfigItemSummary>>> {
    Ok(Json(state.service.list_config_items(&id)?))
}

async fn list_gray_rules_handler(
    State(state): State<Arc<AdminState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<GrayRule>>> {
    Ok(Json(state.service.list_gray_rules(&id)?))
}

// ==================
// Config Item Handlers
// ==================

async fn save_draft_handler(
    State(state): State<Arc<AdminState>>,
    Json(request): Json<SaveDraftRequest>,
) -> ApiResult<Json<ConfigVersion>> {
    let version = state.service.save_draft(
        &request.namespace,
        &request.key,
        request.format,
        &request.value,
    )?;
    Ok(Json(version))
}

async fn get_draft_handler(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<ItemQuery>,
) -> ApiResult<Json<ConfigVersion>> {
    Ok(Json(state.service.get_draft(&query.namespace, &query.key)?))
}

async fn publish_handler(
    State(state): State<Arc<AdminState>>,
    Json(request): Json<PublishRequest>,
) -> ApiResult<Json<ConfigVersion>> {
    Ok(Json(state.service.publish(&request.namespace, &request.key)?))
}

async fn get_published_handler(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<ItemQuery>,
) -> ApiResult<Json<ConfigVersion>> {
    Ok(Json(
        state.service.get_published(&query.namespace, &query.key)?,
    ))
}

async fn delete_config_handler(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<ItemQuery>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .service
        .delete_config_item(&query.namespace, &query.key)?;
    Ok(Json(MessageResponse {
        message: format!("config '{}/{}' deleted", query.namespace, query.key),
    }))
}

// ==================
// Gray Rule Handlers
// ==================

async fn save_gray_rule_handler(
    State(state): State<Arc<AdminState>>,
    Json(request): Json<SaveGrayRuleRequest>,
) -> ApiResult<Json<GrayRule>> {
    // Range-checked here so a percentage like -1 or 1000 is InvalidArgument
    // rather than a deserialization failure.
    if !(0..=100).contains(&request.percentage) {
        return Err(StoreError::InvalidArgument(format!(
            "percentage must be within [0, 100]: {}",
            request.percentage
        ))
        .into());
    }
    let rule = state.service.save_gray_rule(
        &request.namespace,
        &request.key,
        request.percentage as u8,
        request.enabled,
    )?;
    Ok(Json(rule))
}

async fn get_gray_rule_handler(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<ItemQuery>,
) -> ApiResult<Json<GrayRule>> {
    Ok(Json(
        state.service.get_gray_rule(&query.namespace, &query.key)?,
    ))
}

async fn delete_gray_rule_handler(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<ItemQuery>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .service
        .delete_gray_rule(&query.namespace, &query.key)?;
    Ok(Json(MessageResponse {
        message: format!("gray rule '{}/{}' deleted", query.namespace, query.key),
    }))
}
