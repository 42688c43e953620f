//! Error types for the provider client.

use thiserror::Error;

/// Result type for provider client operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider client errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Could not open a connection to the provider
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request or response exceeded its time budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Any other transport failure, including a stream dropped mid-body
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-2xx status
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Response body was not what we expected
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Classify a transport error from reqwest.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_connect() {
            ProviderError::Connect(error.to_string())
        } else if error.is_timeout() {
            ProviderError::Timeout(error.to_string())
        } else {
            ProviderError::Network(error.to_string())
        }
    }
}
