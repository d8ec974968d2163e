use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

/// Splits a byte stream into complete newline-terminated lines.
///
/// Bytes after the last newline stay buffered until a later chunk completes
/// them, so a frame (or a UTF-8 sequence) split across network reads is
/// reassembled instead of dropped.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = memchr(b'\n', &self.buffer[start..]) {
            let end = start + offset;
            if let Some(line) = decode_line(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Flush an unterminated final line once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Err(err) => {
            warn!(error = %err, len = bytes.len(), "Skipping stream line with invalid UTF-8");
            None
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Content(String),
    Empty,
    Error(String),
    Malformed,
}

pub fn parse_frame(line: &str) -> FrameOutcome {
    match serde_json::from_str::<ChatResponse>(line) {
        Ok(frame) => {
            if let Some(error) = frame.error {
                return FrameOutcome::Error(error);
            }
            let content = frame
                .message
                .and_then(|message| message.content)
                .filter(|content| !content.is_empty());
            match content {
                Some(content) => FrameOutcome::Content(content),
                None => {
                    if frame.done {
                        debug!(model = ?frame.model, "Backend marked stream done");
                    }
                    FrameOutcome::Empty
                }
            }
        }
        Err(err) => {
            warn!(error = %err, line, "Skipping malformed stream frame");
            FrameOutcome::Malformed
        }
    }
}

fn process_line(
    line: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    match parse_frame(line) {
        FrameOutcome::Content(content) => {
            let _ = tx.send((StreamMessage::Chunk(content), stream_id));
            false
        }
        FrameOutcome::Error(error) => {
            let _ = tx.send((StreamMessage::Error(error), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
        FrameOutcome::Empty | FrameOutcome::Malformed => false,
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// One-line description of a failed response, preferring the backend's own message.
pub fn format_api_error(status: reqwest::StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    let detail = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| extract_error_summary(&value))
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| trimmed.to_string());

    if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    }
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub chat_endpoint: String,
    pub model: String,
    pub api_messages: Vec<ChatMessage>,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let cancel_token = params.cancel_token.clone();
            let stream_id = params.stream_id;
            tokio::select! {
                _ = run_stream(params, &tx) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "Stream cancelled");
                }
            }
        });
    }
}

async fn run_stream(params: StreamParams, tx: &mpsc::UnboundedSender<(StreamMessage, u64)>) {
    let StreamParams {
        client,
        base_url,
        chat_endpoint,
        model,
        api_messages,
        cancel_token,
        stream_id,
    } = params;

    let request = ChatRequest {
        model,
        messages: api_messages,
        stream: true,
    };

    let chat_url = construct_api_url(&base_url, &chat_endpoint);
    debug!(stream_id, url = %chat_url, model = %request.model, messages = request.messages.len(), "Starting chat stream");

    let response = match client
        .post(chat_url)
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            let _ = tx.send((StreamMessage::Error(e.to_string()), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        let _ = tx.send((
            StreamMessage::Error(format_api_error(status, &error_text)),
            stream_id,
        ));
        let _ = tx.send((StreamMessage::End, stream_id));
        return;
    }

    let mut stream = response.bytes_stream();
    let mut decoder = NdjsonDecoder::new();

    while let Some(chunk) = stream.next().await {
        if cancel_token.is_cancelled() {
            return;
        }

        let chunk_bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send((
                    StreamMessage::Error(format!("stream interrupted: {e}")),
                    stream_id,
                ));
                let _ = tx.send((StreamMessage::End, stream_id));
                return;
            }
        };

        for line in decoder.push(&chunk_bytes) {
            if process_line(&line, tx, stream_id) {
                return;
            }
        }
    }

    if let Some(line) = decoder.finish() {
        if process_line(&line, tx, stream_id) {
            return;
        }
    }

    let _ = tx.send((StreamMessage::End, stream_id));
}
