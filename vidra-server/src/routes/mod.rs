pub mod v1;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", v1::create_v1_router(state.clone()))
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
