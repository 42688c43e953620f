//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::jobs::{RunawayPolicy, TaskWorker, TaskWorkerConfig};
use crate::kernel::ServerDeps;
use crate::server::routes::{
    analyze_text_async_handler, analyze_text_handler, analyze_text_results_handler,
    chat_stream_handler, current_model_handler, health_handler, list_models_handler,
    refine_summary_handler, switch_model_handler, task_status_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub server_deps: Arc<ServerDeps>,
}

/// Build the Axum application router
pub fn build_app(server_deps: Arc<ServerDeps>) -> Router {
    let app_state = AxumAppState { server_deps };

    // CORS configuration - allow any origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        // Fidelity analysis
        .route("/analyze-text", post(analyze_text_handler))
        .route("/analyze-text-async", post(analyze_text_async_handler))
        .route("/task-status/:task_id", get(task_status_handler))
        .route("/analyze-text-results", post(analyze_text_results_handler))
        // Provider gateway
        .route("/api/chat", post(chat_stream_handler))
        .route("/switch_model", post(switch_model_handler))
        .route("/api/models", post(list_models_handler))
        .route("/current_model", post(current_model_handler))
        .route("/chat", post(refine_summary_handler))
        // Health check
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(Extension(app_state)),
        )
}

/// Spawn a task worker on the current runtime, sharing the server's broker and
/// extractor.
///
/// Stops when `shutdown` is cancelled. A computation that outlives the hard
/// time limit has its thread abandoned; the worker and the HTTP server keep
/// running.
pub fn spawn_embedded_worker(
    server_deps: &ServerDeps,
    config: TaskWorkerConfig,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<anyhow::Result<()>> {
    let config = TaskWorkerConfig {
        on_runaway: RunawayPolicy::Abandon,
        ..config
    };
    let worker = TaskWorker::with_config(
        server_deps.tasks.clone(),
        server_deps.extractor.clone(),
        config,
    );

    tokio::spawn(async move {
        let result = worker.run(shutdown).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "embedded task worker stopped");
        }
        result
    })
}
