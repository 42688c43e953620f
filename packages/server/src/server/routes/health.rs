use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::server::app::AxumAppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    current_model: String,
}

/// Health check endpoint
///
/// Always 200 while the process serves requests. Reports the model id new
/// summaries are generated with.
pub async fn health_handler(Extension(state): Extension<AxumAppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        current_model: state.server_deps.model_state.current(),
    })
}
