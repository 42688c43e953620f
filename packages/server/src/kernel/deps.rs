//! Server dependencies shared by every handler.
//!
//! External collaborators sit behind traits or cheap-to-clone handles so tests
//! can swap in an in-memory broker or a fake provider URL.

use std::sync::Arc;

use lemmatizer::LemmaExtractor;
use provider_client::ProviderClient;

use crate::kernel::jobs::TaskBroker;
use crate::kernel::model_state::{ModelState, SwitchLock};

/// Server dependencies accessible to routes and domain actions
#[derive(Clone)]
pub struct ServerDeps {
    /// Provider at the configured base URL; requests naming another endpoint
    /// derive a client from it with `with_base_url`.
    pub provider: ProviderClient,
    /// Long-lived pipeline, loaded once at start-up
    pub extractor: LemmaExtractor,
    pub tasks: Arc<dyn TaskBroker>,
    pub model_state: ModelState,
    pub switch_lock: SwitchLock,
}

impl ServerDeps {
    pub fn new(
        provider: ProviderClient,
        extractor: LemmaExtractor,
        tasks: Arc<dyn TaskBroker>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            extractor,
            tasks,
            model_state: ModelState::new(default_model),
            switch_lock: SwitchLock::new(),
        }
    }

    /// Provider client for a request that may name its own endpoint.
    pub fn provider_for(&self, endpoint: Option<&str>) -> ProviderClient {
        match endpoint.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => self.provider.with_base_url(url),
            None => self.provider.clone(),
        }
    }
}
