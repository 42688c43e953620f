// Main entry point for the API server

use std::sync::Arc;

use anyhow::{Context, Result};
use lemmatizer::{LemmaExtractor, LexiconPipeline};
use provider_client::ProviderClient;
use server_core::kernel::jobs::{InMemoryTaskBroker, PostgresTaskBroker, TaskBroker};
use server_core::kernel::ServerDeps;
use server_core::server::{build_app, spawn_embedded_worker};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting summary fidelity API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Load the lexicon once; every request shares it
    tracing::info!(path = %config.lexicon_path.display(), "Loading lexicon...");
    let lexicon_path = config.lexicon_path.clone();
    let pipeline = tokio::task::spawn_blocking(move || LexiconPipeline::load(lexicon_path))
        .await
        .context("Lexicon loading panicked")?
        .context("Failed to load lexicon")?;
    tracing::info!(entries = pipeline.lexicon().len(), "Lexicon loaded");
    let extractor = LemmaExtractor::new(pipeline);

    // Task broker
    let tasks: Arc<dyn TaskBroker> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Migrations complete");

            Arc::new(PostgresTaskBroker::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, analysis tasks are kept in memory");
            Arc::new(InMemoryTaskBroker::new().with_retention(config.task_retention))
        }
    };

    let provider = ProviderClient::new(&config.provider_base_url)
        .with_read_timeout(config.provider_read_timeout)
        .with_api_key(config.provider_api_key.clone());
    if !provider.has_api_key() {
        tracing::warn!("OPENAI_API_KEY not set, provider requests are unauthenticated");
    }

    let server_deps = Arc::new(ServerDeps::new(
        provider,
        extractor,
        tasks,
        config.default_model.clone(),
    ));

    let shutdown = CancellationToken::new();
    let worker = if config.embedded_worker {
        tracing::info!("Starting embedded task worker");
        Some(spawn_embedded_worker(
            &server_deps,
            config.worker.task_worker_config(),
            shutdown.clone(),
        ))
    } else {
        None
    };

    // Build application
    let app = build_app(server_deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    let signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received shutdown signal");
        signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("Server error")?;

    if let Some(worker) = worker {
        worker.await.context("Embedded task worker panicked")??;
    }

    tracing::info!("Server stopped");
    Ok(())
}
