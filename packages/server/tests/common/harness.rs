//! Test harness running the real router on an ephemeral port.
//!
//! Tasks live in an in-memory broker and the lexicon is a handful of rows, so
//! no database or lexicon file is needed.

use std::sync::Arc;
use std::time::Duration;

use lemmatizer::testing::extractor_with;
use lemmatizer::{LemmaExtractor, Upos};
use provider_client::ProviderClient;
use server_core::kernel::jobs::{InMemoryTaskBroker, TaskWorkerConfig};
use server_core::kernel::ServerDeps;
use server_core::server::{build_app, spawn_embedded_worker};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// A small Slovenian lexicon covering the texts used in the tests.
pub fn slovene_extractor() -> LemmaExtractor {
    extractor_with([
        ("hiša", "hiša", Upos::Noun),
        ("je", "biti", Upos::Aux),
        ("velika", "velik", Upos::Adj),
        ("lepa", "lep", Upos::Adj),
        ("miška", "miška", Upos::Noun),
        ("miska", "miska", Upos::Noun),
        ("spi", "spati", Upos::Verb),
    ])
}

pub struct TestHarness {
    pub base_url: String,
    pub client: reqwest::Client,
    pub deps: Arc<ServerDeps>,
    pub tasks: Arc<InMemoryTaskBroker>,
    shutdown: CancellationToken,
}

impl TestHarness {
    /// Server whose configured provider is `provider_url`. No worker runs.
    pub async fn start(provider_url: &str) -> Self {
        Self::start_with(provider_url, false, None).await
    }

    /// Server with an embedded worker draining the task broker.
    pub async fn start_with_worker(provider_url: &str) -> Self {
        Self::start_with(provider_url, true, None).await
    }

    /// Server that gives up on a silent provider after `read_timeout`.
    pub async fn start_with_read_timeout(provider_url: &str, read_timeout: Duration) -> Self {
        Self::start_with(provider_url, false, Some(read_timeout)).await
    }

    async fn start_with(
        provider_url: &str,
        embedded_worker: bool,
        read_timeout: Option<Duration>,
    ) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let tasks = Arc::new(InMemoryTaskBroker::new());
        let mut provider = ProviderClient::new(provider_url).with_api_key(Some("sk-test".into()));
        if let Some(read_timeout) = read_timeout {
            provider = provider.with_read_timeout(read_timeout);
        }
        let deps = Arc::new(ServerDeps::new(
            provider,
            slovene_extractor(),
            tasks.clone(),
            DEFAULT_MODEL,
        ));

        let shutdown = CancellationToken::new();
        if embedded_worker {
            let config = TaskWorkerConfig {
                poll_interval: Duration::from_millis(10),
                ..TaskWorkerConfig::with_worker_id("test-worker")
            };
            spawn_embedded_worker(&deps, config, shutdown.clone());
        }

        let app = build_app(deps.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let serve_shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(serve_shutdown.cancelled_owned())
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            deps,
            tasks,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// Current model as reported by `/health`.
    pub async fn current_model(&self) -> String {
        let health: serde_json::Value = self.get("/health").await.json().await.unwrap();
        health["current_model"].as_str().unwrap().to_string()
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
