//! Provider model catalog passthroughs.

use provider_client::ProviderClient;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::common::{AppError, AppResult};

/// Body of `/api/models` and `/current_model`.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointRequest {
    pub api_endpoint: String,
}

/// Accept only absolute URLs with a scheme and a host.
pub fn parse_endpoint(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    let invalid = || AppError::Input(format!("Invalid URL format: {}", trimmed));

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || url.host_str().map_or(true, str::is_empty) {
        return Err(invalid());
    }

    Ok(trimmed.to_string())
}

pub async fn list_models(
    provider: &ProviderClient,
    endpoint: &str,
) -> AppResult<serde_json::Value> {
    let endpoint = parse_endpoint(endpoint)?;
    let models = provider.with_base_url(&endpoint).list_models().await?;

    info!(endpoint = %endpoint, "retrieved model list");
    Ok(models)
}

pub async fn current_model(
    provider: &ProviderClient,
    endpoint: &str,
) -> AppResult<serde_json::Value> {
    let endpoint = parse_endpoint(endpoint)?;
    let model = provider.with_base_url(&endpoint).current_model().await?;

    info!(endpoint = %endpoint, "retrieved current model");
    Ok(model)
}
