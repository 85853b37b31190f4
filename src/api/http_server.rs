// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};

use super::upload::upload_handler;
use crate::config::NodeConfig;
use crate::version;
use crate::vision::ModelManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<NodeConfig>,
    pub models: Arc<ModelManager>,
}

impl AppState {
    pub fn new(config: NodeConfig) -> Self {
        let models = ModelManager::new(config.model_path.clone(), config.dict_path.clone());
        Self {
            config: Arc::new(config),
            models: Arc::new(models),
        }
    }
}

/// Build the application router
///
/// The transport body limit sits above the upload cap; the handler's own
/// size check produces the JSON rejection.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes * 2;

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // CAPTCHA upload endpoint
        .route("/upload/", post(upload_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(config: NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.listen_addr.parse::<SocketAddr>()?;
    let state = AppState::new(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::response::Json(json!({
        "status": "ok",
        "version": version::VERSION,
        "model_ready": state.models.is_ready(),
    }))
}
