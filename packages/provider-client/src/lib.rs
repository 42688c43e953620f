//! Pure REST client for OpenAI-compatible completion providers
//!
//! Covers the provider surface the gateway needs and nothing else: chat completions
//! (streamed and not), the streamed model-switch endpoint, model listing, and the
//! current-model lookup. No domain logic lives here.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use provider_client::{ChatRequest, Message, ProviderClient};
//!
//! let client = ProviderClient::new("https://api.openai.com").with_api_key(Some(key));
//!
//! let mut lines = client
//!     .chat_completion_stream(ChatRequest::new("gpt-3.5-turbo").message(Message::user("Hello!")))
//!     .await?;
//!
//! while let Some(line) = lines.next().await {
//!     println!("{}", line?);
//! }
//! ```

pub mod error;
pub mod streaming;
pub mod types;

pub use error::{ProviderError, Result};
pub use streaming::SseLineStream;
pub use types::*;

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response};
use tracing::{debug, warn};

/// Timeout for non-streaming calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout applied to every call, streamed or not.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest silence tolerated between two reads of a response body.
///
/// Streams have no overall deadline, so this is what ends a stalled one.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Provider API client.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct ProviderClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ProviderClient {
    /// Create a client for the given base URL (e.g. `https://api.openai.com`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: build_http_client(DEFAULT_READ_TIMEOUT),
            api_key: None,
            base_url: normalize_base(base_url.into()),
        }
    }

    /// Replace the read timeout. Starts a fresh connection pool.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.http_client = build_http_client(read_timeout);
        self
    }

    /// Bearer token forwarded on every call. `None` sends no Authorization header.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Same credentials and connection pool, different provider.
    pub fn with_base_url(&self, url: impl Into<String>) -> Self {
        Self {
            http_client: self.http_client.clone(),
            api_key: self.api_key.clone(),
            base_url: normalize_base(url.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Streaming chat completion.
    ///
    /// Sends `stream: true` and returns the raw SSE lines. A non-2xx answer is read
    /// in full and returned as [`ProviderError::Status`].
    pub async fn chat_completion_stream(&self, request: ChatRequest) -> Result<SseLineStream> {
        let mut body = serde_json::to_value(&request)
            .map_err(|e| ProviderError::Parse(format!("Failed to serialize request: {}", e)))?;
        body["stream"] = serde_json::Value::Bool(true);

        let response = self
            .authorized(self.http_client.post(self.url("/v1/chat/completions")))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "provider streaming request failed");
                ProviderError::from_transport(e)
            })?;

        let response = ensure_success(response).await?;
        Ok(SseLineStream::new(response.bytes_stream()))
    }

    /// Non-streaming chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .authorized(self.http_client.post(self.url("/v1/chat/completions")))
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "provider request failed");
                ProviderError::from_transport(e)
            })?;

        let response = ensure_success(response).await?;

        let chat_response: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Parse("No choices in provider response".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "provider chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: chat_response.usage,
        })
    }

    /// Ask the provider to load another model. Progress arrives as SSE lines.
    pub async fn switch_model_stream(&self, model_name: &str) -> Result<SseLineStream> {
        let response = self
            .authorized(
                self.http_client
                    .post(self.url(&format!("/switch_model/{}", model_name))),
            )
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %model_name, "model switch request failed");
                ProviderError::from_transport(e)
            })?;

        let response = ensure_success(response).await?;
        Ok(SseLineStream::new(response.bytes_stream()))
    }

    /// `GET /models`, returned as the provider's JSON.
    pub async fn list_models(&self) -> Result<serde_json::Value> {
        self.get_json("/models").await
    }

    /// `GET /current_model`, returned as the provider's JSON.
    pub async fn current_model(&self) -> Result<serde_json::Value> {
        self.get_json("/current_model").await
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let response = self
            .authorized(self.http_client.get(self.url(path)))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, path = %path, "provider request failed");
                ProviderError::from_transport(e)
            })?;

        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header(header::AUTHORIZATION, format!("Bearer {}", key)),
            None => builder,
        }
    }
}

/// Turn a non-2xx response into [`ProviderError::Status`] carrying the body text.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, error = %body, "provider API error");
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

fn build_http_client(read_timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(read_timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "falling back to default HTTP client");
            Client::new()
        })
}

fn normalize_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = ProviderClient::new("https://custom.api.com/")
            .with_api_key(Some("sk-test".into()));

        assert_eq!(client.api_key.as_deref(), Some("sk-test"));
        assert_eq!(client.base_url(), "https://custom.api.com");
        assert_eq!(
            client.url("/v1/chat/completions"),
            "https://custom.api.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_with_base_url_keeps_credentials() {
        let client = ProviderClient::new("https://a.example").with_api_key(Some("k".into()));
        let other = client.with_base_url(" http://10.0.0.5:8080/ ");

        assert!(other.has_api_key());
        assert_eq!(other.base_url(), "http://10.0.0.5:8080");
        assert_eq!(client.base_url(), "https://a.example");
    }
}
