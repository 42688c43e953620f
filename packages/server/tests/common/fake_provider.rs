//! In-process stand-in for an OpenAI-compatible provider.
//!
//! Serves scripted chat, switch and catalog answers on an ephemeral port and
//! records every request body it receives.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use async_stream::stream;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

/// What the fake provider answers with.
#[derive(Clone)]
pub struct ProviderScript {
    /// Raw lines of a streamed chat completion, sent as `<line>\n\n`
    pub chat_lines: Vec<String>,
    /// Non-2xx status for chat completions, answered with `chat_error_body`
    pub chat_status: Option<StatusCode>,
    pub chat_error_body: String,
    /// Content of a non-streamed completion
    pub completion: String,
    /// Switch lines sent before the gate opens
    pub switch_before_gate: Vec<String>,
    /// Switch lines sent after [`FakeProvider::open_switch_gate`]
    pub switch_after_gate: Vec<String>,
    pub switch_status: Option<StatusCode>,
    pub models: Value,
    pub current_model: Value,
}

impl Default for ProviderScript {
    fn default() -> Self {
        Self {
            chat_lines: vec![
                r#"data: {"choices":[{"delta":{"content":"Hiša"}}]}"#.to_string(),
                r#"data: {"choices":[{"delta":{"content":" je lepa."}}]}"#.to_string(),
                "data: [DONE]".to_string(),
            ],
            chat_status: None,
            chat_error_body: String::new(),
            completion: "  Krajši povzetek.  ".to_string(),
            switch_before_gate: vec![r#"data: {"status": "loading"}"#.to_string()],
            switch_after_gate: vec![r#"data: {"status": "success"}"#.to_string()],
            switch_status: None,
            models: json!({"data": [{"id": "gams"}, {"id": "gpt-3.5-turbo"}]}),
            current_model: json!({"model": "gams"}),
        }
    }
}

/// A request the provider received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

struct Shared {
    script: ProviderScript,
    requests: Mutex<Vec<RecordedRequest>>,
    switch_gate: Notify,
}

impl Shared {
    fn record(&self, path: String, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.requests.lock().unwrap().push(RecordedRequest {
            path,
            authorization,
            body,
        });
    }
}

pub struct FakeProvider {
    pub base_url: String,
    shared: Arc<Shared>,
}

impl FakeProvider {
    pub async fn start(script: ProviderScript) -> Self {
        let shared = Arc::new(Shared {
            script,
            requests: Mutex::new(Vec::new()),
            switch_gate: Notify::new(),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .route("/switch_model/:name", post(switch_model))
            .route("/models", get(models))
            .route("/current_model", get(current_model))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            shared,
        }
    }

    /// Let the held switch stream send its remaining lines.
    pub fn open_switch_gate(&self) {
        self.shared.switch_gate.notify_one();
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().unwrap().clone()
    }
}

fn frames(lines: &[String]) -> String {
    lines.iter().map(|line| format!("{}\n\n", line)).collect()
}

async fn chat_completions(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let streamed = body["stream"].as_bool().unwrap_or(false);
    shared.record("/v1/chat/completions".into(), &headers, body);

    let script = &shared.script;
    if let Some(status) = script.chat_status {
        return (status, script.chat_error_body.clone()).into_response();
    }

    if streamed {
        return (
            [("content-type", "text/event-stream")],
            frames(&script.chat_lines),
        )
            .into_response();
    }

    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": script.completion}}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
    }))
    .into_response()
}

async fn switch_model(
    State(shared): State<Arc<Shared>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    shared.record(format!("/switch_model/{}", name), &headers, Value::Null);

    if let Some(status) = shared.script.switch_status {
        return (status, format!("unknown model {}", name)).into_response();
    }

    let body = stream! {
        yield Ok::<_, Infallible>(Bytes::from(frames(&shared.script.switch_before_gate)));
        shared.switch_gate.notified().await;
        yield Ok(Bytes::from(frames(&shared.script.switch_after_gate)));
    };

    ([("content-type", "text/event-stream")], Body::from_stream(body)).into_response()
}

async fn models(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Json<Value> {
    shared.record("/models".into(), &headers, Value::Null);
    Json(shared.script.models.clone())
}

async fn current_model(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Json<Value> {
    shared.record("/current_model".into(), &headers, Value::Null);
    Json(shared.script.current_model.clone())
}

/// Provider that answers every request with a chunked `200` carrying one
/// `<line>\n\n` chunk, then closes the socket before the final chunk.
///
/// Returns its base URL.
pub async fn start_truncating_provider(line: &str) -> String {
    let frame = format!("{}\n\n", line);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let frame = frame.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\n\
                     content-type: text/event-stream\r\n\
                     transfer-encoding: chunked\r\n\r\n\
                     {:x}\r\n{}\r\n",
                    frame.len(),
                    frame
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.flush().await.unwrap();
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// Consume one request: head plus a `content-length` body.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
    let body_len: usize = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);

    while buf.len() < head_end + body_len {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}
