//! Server-sent-event framing shared by the chat and model-switch relays.
//!
//! Provider lines are forwarded byte-for-byte with a blank-line terminator.
//! Failures after the response has started are reported in-band as a single
//! `data: {"error": ...}` event.

use std::convert::Infallible;

use bytes::Bytes;
use futures::Stream;
use provider_client::ProviderError;

/// Body stream handed to the HTTP layer.
pub type EventStream = std::pin::Pin<Box<dyn Stream<Item = Result<Bytes, Infallible>> + Send>>;

/// Which provider lines a relay forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePolicy {
    /// Only `data:` lines
    DataOnly,
    /// Every non-empty line
    AllLines,
}

impl LinePolicy {
    pub fn forwards(self, line: &str) -> bool {
        match self {
            LinePolicy::DataOnly => line.starts_with("data: "),
            LinePolicy::AllLines => !line.is_empty(),
        }
    }
}

/// Frame one provider line as an event.
pub fn event(line: &str) -> Bytes {
    Bytes::from(format!("{}\n\n", line))
}

/// Terminal in-band error event.
pub fn error_event(message: impl Into<String>) -> Bytes {
    let payload = serde_json::json!({ "error": message.into() });
    Bytes::from(format!("data: {}\n\n", payload))
}

/// Error event for a transport failure while streaming.
pub fn transport_error_event(error: &ProviderError) -> Bytes {
    match error {
        ProviderError::Connect(_) => error_event("Failed to connect to API service"),
        other => error_event(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_verbatim_line_plus_blank_line() {
        let line = r#"data: {"choices":[{"delta":{"content":"Živjo"}}]}"#;
        assert_eq!(event(line), Bytes::from(format!("{}\n\n", line)));
    }

    #[test]
    fn test_error_event_escapes_message() {
        assert_eq!(
            error_event("bad \"quote\""),
            Bytes::from_static(b"data: {\"error\":\"bad \\\"quote\\\"\"}\n\n")
        );
    }

    #[test]
    fn test_line_policies() {
        assert!(LinePolicy::DataOnly.forwards("data: [DONE]"));
        assert!(!LinePolicy::DataOnly.forwards("event: ping"));
        assert!(!LinePolicy::DataOnly.forwards(": keep-alive"));
        assert!(LinePolicy::AllLines.forwards("event: ping"));
        assert!(!LinePolicy::AllLines.forwards(""));
    }

    #[test]
    fn test_connect_failure_message() {
        let event = transport_error_event(&ProviderError::Connect("refused".into()));
        assert_eq!(
            event,
            Bytes::from_static(b"data: {\"error\":\"Failed to connect to API service\"}\n\n")
        );
    }
}
