//! Line splitter for server-sent-event response bodies.
//!
//! Converts a raw `reqwest` byte stream into complete, non-empty text lines.
//! Lines are yielded exactly as the provider sent them, minus the line terminator;
//! nothing is parsed or rewritten. Bytes are buffered until a full line is
//! available, so multi-byte characters split across chunks survive intact.

use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::ProviderError;

/// Stream adapter yielding SSE lines (`data: {...}`, `event: ...`, ...).
pub struct SseLineStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    buffer: Vec<u8>,
    finished: bool,
}

impl SseLineStream {
    pub fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
            finished: false,
        }
    }
}

impl Stream for SseLineStream {
    type Item = Result<String, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(line) = next_line(&mut this.buffer) {
                return Poll::Ready(Some(line));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    this.buffer.clear();
                    return Poll::Ready(Some(Err(ProviderError::from_transport(e))));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    // Body ended without a trailing newline
                    if !this.buffer.is_empty() {
                        this.buffer.push(b'\n');
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Pop the next complete non-empty line off the buffer.
fn next_line(buffer: &mut Vec<u8>) -> Option<Result<String, ProviderError>> {
    loop {
        let newline_pos = buffer.iter().position(|b| *b == b'\n')?;
        let mut raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }

        // SSE uses blank lines as event separators
        if raw.is_empty() {
            continue;
        }

        return Some(String::from_utf8(raw).map_err(|e| {
            ProviderError::Parse(format!("Invalid UTF-8 in stream: {}", e))
        }));
    }
}
