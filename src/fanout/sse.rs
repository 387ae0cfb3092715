//! Server-sent events transport for status snapshots.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{FanoutError, StatusSource, StatusStream};
use crate::models::ProcessingStatus;
use crate::observability::Metrics;
use crate::transport::ApiClient;

const EVENT_STREAM: &str = "text/event-stream";

/// Longest unterminated line kept between chunks
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `message` when the server sent no `event:` field
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Incremental `text/event-stream` parser.
///
/// Chunks may split lines anywhere; incomplete lines are buffered until
/// the next push, up to `max_line` bytes.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    max_line: usize,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_line_limit(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_limit(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line,
            event: None,
            data: Vec::new(),
            id: None,
        }
    }

    /// Feed one chunk, returning every event it completed.
    ///
    /// Fails once the unterminated tail exceeds the line limit; the buffer
    /// is dropped and the decoder should not be reused.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, FanoutError> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        if self.buffer.len() > self.max_line {
            let pending = self.buffer.len();
            self.buffer = Vec::new();
            return Err(FanoutError::Stream(format!(
                "event stream line exceeds {} bytes ({} buffered)",
                self.max_line, pending
            )));
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data).join("\n"),
            id: self.id.clone(),
        })
    }
}

/// Push source: a long-lived `GET <stream_path>` carrying `status_update` events
pub struct SseStatusSource {
    api: ApiClient,
    path: String,
    event_name: String,
    metrics: Arc<Metrics>,
}

impl SseStatusSource {
    pub fn new(api: ApiClient, path: impl Into<String>, event_name: impl Into<String>) -> Self {
        let metrics = api.metrics().clone();
        Self {
            api,
            path: path.into(),
            event_name: event_name.into(),
            metrics,
        }
    }
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<ProcessingStatus>,
    event_name: String,
    metrics: Arc<Metrics>,
}

impl StreamState {
    fn accept(&mut self, event: SseEvent) {
        if event.event != self.event_name {
            debug!(event = %event.event, "Ignoring unrelated event");
            return;
        }

        match serde_json::from_str::<ProcessingStatus>(&event.data) {
            Ok(status) => self.pending.push_back(status),
            Err(e) => {
                self.metrics.malformed_payload();
                warn!(error = %e, "Discarding unreadable status event");
            }
        }
    }
}

#[async_trait]
impl StatusSource for SseStatusSource {
    async fn open(&self) -> Result<StatusStream, FanoutError> {
        let response = self.api.open_stream(&self.path, EVENT_STREAM).await?;
        info!(path = %self.path, "Status stream opened");

        let state = StreamState {
            body: response.bytes_stream().boxed(),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            event_name: self.event_name.clone(),
            metrics: self.metrics.clone(),
        };

        let statuses = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(status) = state.pending.pop_front() {
                    return Some((Ok(status), state));
                }
                match state.body.next().await {
                    Some(Ok(chunk)) => match state.decoder.push(&chunk) {
                        Ok(events) => {
                            for event in events {
                                state.accept(event);
                            }
                        }
                        Err(e) => return Some((Err(e), state)),
                    },
                    Some(Err(e)) => return Some((Err(FanoutError::Stream(e.to_string())), state)),
                    None => return None,
                }
            }
        });

        Ok(statuses.boxed())
    }

    fn name(&self) -> &'static str {
        "sse"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"event: status_update\ndata: {\"is_processing\":true}\n\n").unwrap();

        assert_eq!(
            events,
            vec![SseEvent {
                event: "status_update".into(),
                data: "{\"is_processing\":true}".into(),
                id: None,
            }]
        );
    }

    #[test]
    fn chunks_split_mid_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: status_up").unwrap().is_empty());
        assert!(decoder.push(b"date\r\ndata: {\"total_").unwrap().is_empty());
        let events = decoder.push(b"topics\":4}\r\n\r\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "status_update");
        assert_eq!(events[0].data, "{\"total_topics\":4}");
    }

    #[test]
    fn multi_line_data_comments_and_defaults() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\n\nid: 7\ndata: a\ndata: b\n\nevent: ping\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "a\nb");
        assert_eq!(events[0].id.as_deref(), Some("7"));
    }

    #[test]
    fn several_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: 1\n\ndata: 2\n\ndata: 3").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(decoder.push(b"\n\n").unwrap()[0].data, "3");
    }

    #[test]
    fn unterminated_line_over_limit_fails() {
        let mut decoder = SseDecoder::with_line_limit(16);
        assert!(decoder.push(b"data: 0123456").unwrap().is_empty());

        let err = decoder.push(b"789abcdef").unwrap_err();
        assert!(matches!(err, FanoutError::Stream(_)));
    }

    #[test]
    fn complete_lines_do_not_count_toward_limit() {
        let mut decoder = SseDecoder::with_line_limit(16);
        let events = decoder.push(b"data: 0123456789\n\ndata: 0123456789\n\n").unwrap();
        assert_eq!(events.len(), 2);
    }
}
