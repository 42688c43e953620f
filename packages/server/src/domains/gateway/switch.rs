//! Model switching.
//!
//! At most one switch runs at a time. The switch lock is taken before the
//! provider is contacted and travels inside the relay stream, so it is released
//! exactly when the stream finishes or the client goes away. While relaying,
//! each line is inspected before it is forwarded; the first success report
//! commits the new model id.

use async_stream::stream;
use futures::StreamExt;
use provider_client::{ProviderClient, ProviderError};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::catalog::parse_endpoint;
use super::relay::{error_event, event, transport_error_event, EventStream, LinePolicy};
use crate::common::{AppError, AppResult};
use crate::kernel::{ModelState, ServerDeps, SwitchPermit};

pub const SWITCH_IN_PROGRESS: &str = "Model switch already in progress. Please try again later.";

/// Body of `POST /switch_model`.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchModelRequest {
    pub model_name: String,
    #[serde(default)]
    pub api_endpoint: Option<String>,
}

/// Validate the request, take the switch lock and start relaying.
///
/// Fails with [`AppError::Conflict`] without waiting if another switch holds
/// the lock.
pub fn begin_switch(deps: &ServerDeps, request: SwitchModelRequest) -> AppResult<EventStream> {
    let model_name = request.model_name.trim().to_string();
    if model_name.is_empty() {
        return Err(AppError::Input("model_name is required".into()));
    }

    let endpoint = request
        .api_endpoint
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| AppError::Input("API endpoint is required".into()))?;
    let endpoint = parse_endpoint(endpoint)?;

    let Some(permit) = deps.switch_lock.try_acquire() else {
        warn!(model = %model_name, "model switch rejected, another switch in progress");
        return Err(AppError::Conflict(SWITCH_IN_PROGRESS.into()));
    };

    info!(model = %model_name, endpoint = %endpoint, "model switch started");
    Ok(relay_switch(
        deps.provider.with_base_url(endpoint),
        model_name,
        deps.model_state.clone(),
        permit,
    ))
}

fn relay_switch(
    provider: ProviderClient,
    model_name: String,
    model_state: ModelState,
    permit: SwitchPermit,
) -> EventStream {
    Box::pin(stream! {
        let permit = permit;

        let mut lines = match provider.switch_model_stream(&model_name).await {
            Ok(lines) => lines,
            Err(ProviderError::Status { status, body }) => {
                error!(
                    status,
                    error = %body,
                    model = %model_name,
                    "provider rejected model switch"
                );
                yield Ok(error_event(body));
                return;
            }
            Err(e) => {
                error!(error = %e, model = %model_name, "model switch failed to start");
                yield Ok(transport_error_event(&e));
                return;
            }
        };

        let mut committed = false;
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) if LinePolicy::AllLines.forwards(&line) => {
                    if !committed && reports_success(&line) {
                        model_state.commit(&permit, model_name.clone());
                        committed = true;
                        info!(model = %model_name, "model switch committed");
                    }
                    yield Ok(event(&line));
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, model = %model_name, "model switch stream interrupted");
                    yield Ok(transport_error_event(&e));
                    return;
                }
            }
        }

        if !committed {
            warn!(model = %model_name, "model switch stream ended without success");
        }
    })
}

/// `data: {"status": "success", ...}`
fn reports_success(line: &str) -> bool {
    let Some(payload) = line.strip_prefix("data: ") else {
        return false;
    };

    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|value| value.get("status")?.as_str().map(|s| s == "success"))
        .unwrap_or(false)
}
