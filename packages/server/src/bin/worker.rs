// Standalone task worker
//
// Claims analysis tasks from the Postgres broker and runs lemma extraction.
// Run as many of these as needed next to one or more API servers.

use std::sync::Arc;

use anyhow::{Context, Result};
use lemmatizer::{LemmaExtractor, LexiconPipeline};
use server_core::kernel::jobs::{PostgresTaskBroker, TaskWorker};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required to run a standalone worker")?;

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let lexicon_path = config.lexicon_path.clone();
    let pipeline = tokio::task::spawn_blocking(move || LexiconPipeline::load(lexicon_path))
        .await
        .context("Lexicon loading panicked")?
        .context("Failed to load lexicon")?;
    tracing::info!(entries = pipeline.lexicon().len(), "Lexicon loaded");

    let worker = TaskWorker::with_config(
        Arc::new(PostgresTaskBroker::new(pool)),
        LemmaExtractor::new(pipeline),
        config.worker.task_worker_config(),
    );

    worker.run_until_shutdown().await
}
