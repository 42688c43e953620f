//! Streaming summary generation relayed from the provider.

use async_stream::stream;
use futures::StreamExt;
use provider_client::{ChatRequest, Message, ProviderClient, ProviderError};
use serde::Deserialize;
use tracing::{debug, error, info};

use super::prompts::{instruction_prefix, SummaryCategory};
use super::relay::{error_event, event, transport_error_event, EventStream, LinePolicy};
use crate::common::{AppError, AppResult};

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> i64 {
    2048
}

fn default_top_k() -> i64 {
    50
}

fn default_top_p() -> f32 {
    0.9
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChatRequest {
    pub input_text: String,
    /// Provider base URL overriding the configured one
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub is_bullet: bool,
    #[serde(default)]
    pub summary_category: SummaryCategory,
    /// Derived from `is_bullet`, `summary_category` and `num_bullet_points` when absent
    #[serde(default)]
    pub instruction_prefix: Option<String>,
    #[serde(default)]
    pub num_bullet_points: Option<u32>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default)]
    pub frequency_penalty: f32,
}

/// Validated sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
}

impl StreamChatRequest {
    pub fn sampling(&self) -> AppResult<SamplingParams> {
        check_range("temperature", self.temperature, 0.0, 2.0)?;
        check_range("top_p", self.top_p, 0.0, 1.0)?;
        check_range("frequency_penalty", self.frequency_penalty, -2.0, 2.0)?;

        let max_tokens = u32::try_from(self.max_tokens)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| AppError::Input("max_tokens must be at least 1".into()))?;
        let top_k = u32::try_from(self.top_k)
            .map_err(|_| AppError::Input("top_k must be between 0 and 4294967295".into()))?;

        Ok(SamplingParams {
            temperature: self.temperature,
            max_tokens,
            top_k,
            top_p: self.top_p,
            frequency_penalty: self.frequency_penalty,
        })
    }

    pub fn prefix(&self) -> String {
        match &self.instruction_prefix {
            Some(prefix) => prefix.clone(),
            None => instruction_prefix(
                self.is_bullet,
                self.summary_category,
                self.num_bullet_points,
            ),
        }
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> AppResult<()> {
    if !(min..=max).contains(&value) {
        return Err(AppError::Input(format!(
            "{} must be between {} and {}",
            name, min, max
        )));
    }
    Ok(())
}

/// Single user message `<prefix>\n\n<input>` for `model`.
pub fn build_chat_request(
    model: String,
    prefix: &str,
    input_text: &str,
    sampling: SamplingParams,
) -> ChatRequest {
    ChatRequest::new(model)
        .message(Message::user(format!("{}\n\n{}", prefix, input_text)))
        .temperature(sampling.temperature)
        .max_tokens(sampling.max_tokens)
        .top_k(sampling.top_k)
        .top_p(sampling.top_p)
        .frequency_penalty(sampling.frequency_penalty)
}

/// Relay a streamed completion.
///
/// Every provider `data:` line is forwarded in order and unmodified. Failures
/// end the stream with one in-band error event; nothing is retried.
pub fn stream_chat(provider: ProviderClient, request: ChatRequest) -> EventStream {
    Box::pin(stream! {
        info!(
            model = %request.model,
            endpoint = %provider.base_url(),
            "starting streaming request to provider"
        );

        let mut lines = match provider.chat_completion_stream(request).await {
            Ok(lines) => lines,
            Err(ProviderError::Status { status, body }) => {
                error!(status, error = %body, "provider rejected chat request");
                yield Ok(error_event(format!("API Error: {}", body)));
                return;
            }
            Err(e) => {
                error!(error = %e, "chat stream failed to start");
                yield Ok(transport_error_event(&e));
                return;
            }
        };

        let mut forwarded = 0usize;
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) if LinePolicy::DataOnly.forwards(&line) => {
                    forwarded += 1;
                    yield Ok(event(&line));
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "chat stream interrupted");
                    yield Ok(transport_error_event(&e));
                    return;
                }
            }
        }

        debug!(events = forwarded, "chat stream finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> StreamChatRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = request(json!({"input_text": "Besedilo."}));
        let sampling = req.sampling().unwrap();

        assert_eq!(sampling.temperature, 0.3);
        assert_eq!(sampling.max_tokens, 2048);
        assert_eq!(sampling.top_k, 50);
        assert_eq!(sampling.top_p, 0.9);
        assert_eq!(sampling.frequency_penalty, 0.0);
        assert!(req.api_endpoint.is_none());
    }

    #[test]
    fn test_out_of_range_is_input_error() {
        for body in [
            json!({"input_text": "x", "temperature": 2.5}),
            json!({"input_text": "x", "top_p": -0.1}),
            json!({"input_text": "x", "frequency_penalty": 3}),
            json!({"input_text": "x", "max_tokens": 0}),
            json!({"input_text": "x", "top_k": -1}),
        ] {
            let err = request(body.clone()).sampling().unwrap_err();
            assert!(matches!(err, AppError::Input(_)), "{} accepted", body);
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let req = request(json!({
            "input_text": "x",
            "temperature": 2.0,
            "top_p": 0.0,
            "frequency_penalty": -2.0,
            "top_k": 0,
            "max_tokens": 1
        }));
        assert!(req.sampling().is_ok());
    }

    #[test]
    fn test_explicit_prefix_wins() {
        let req = request(json!({
            "input_text": "x",
            "is_bullet": true,
            "summary_category": "concise",
            "instruction_prefix": "Povzemi."
        }));
        assert_eq!(req.prefix(), "Povzemi.");
    }

    #[test]
    fn test_prefix_derived_when_missing() {
        let req = request(json!({
            "input_text": "x",
            "is_bullet": true,
            "summary_category": "concise",
            "num_bullet_points": 4
        }));
        assert_eq!(req.prefix(), "Pretvori besedilo v 4 alinej. Naj bodo kratke in jasne.");
    }

    #[test]
    fn test_user_message_joins_prefix_and_input() {
        let sampling = request(json!({"input_text": "x"})).sampling().unwrap();
        let chat = build_chat_request("gams".into(), "Povzemi.", "Besedilo.", sampling);

        assert_eq!(chat.model, "gams");
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.messages[0].role, "user");
        assert_eq!(chat.messages[0].content, "Povzemi.\n\nBesedilo.");
        assert_eq!(chat.top_k, Some(50));
    }
}
