//! Service Notify API
//!
//! HTTP endpoints for:
//! - On-demand push token cleanup
//! - Health and readiness endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sn_common::CleanupOutcome;
use sn_dispatch::TokenSanitizer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sanitizer: Arc<TokenSanitizer>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
}

/// Runs one full sweep. Both GET and POST are accepted.
async fn cleanup_tokens(State(state): State<AppState>) -> (StatusCode, Json<CleanupOutcome>) {
    info!("Token cleanup requested");
    let outcome = state.sanitizer.run().await;

    match &outcome {
        CleanupOutcome::Completed { cleaned_tokens } => {
            info!(cleaned_tokens = cleaned_tokens, "Token cleanup finished");
            (StatusCode::OK, Json(outcome))
        }
        CleanupOutcome::Failed { error } => {
            warn!(error = %error, "Token cleanup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(outcome))
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn ready() -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "READY".to_string(),
    })
}

pub fn create_router(sanitizer: Arc<TokenSanitizer>) -> Router {
    let state = AppState { sanitizer };

    Router::new()
        .route("/cleanup-tokens", get(cleanup_tokens).post(cleanup_tokens))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
