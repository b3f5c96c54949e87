//! Streaming chat-completion transport.
//!
//! One call posts an OpenAI-compatible request with `stream: true` and reports
//! everything through a [`StreamHandler`]: tokens in arrival order, then
//! exactly one of `on_complete` or `on_error`. Failures are never returned to
//! the caller directly.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use ziwei_core::config::DEFAULT_TIMEOUT_SECS;
use ziwei_core::session::{ChatMessage, MessageRole};
use ziwei_core::{Result, ZiweiError};

use crate::sse::{DataLine, SseLineBuffer, parse_data_line};

/// Receives the outcome of one streamed request.
pub trait StreamHandler: Send {
    fn on_token(&mut self, token: &str);
    /// Called once with the concatenation of every token.
    fn on_complete(&mut self, full_content: &str);
    /// Called once on HTTP, network, abort or timeout failure.
    fn on_error(&mut self, error: ZiweiError);
}

/// Where a request goes and how it authenticates.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub api_key: String,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<RequestMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: String,
}

impl RequestMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User.as_str().to_string(),
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for RequestMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

/// The request as sent: the caller's fields plus the forced `stream` flag.
#[derive(Serialize)]
struct StreamingBody<'a> {
    #[serde(flatten)]
    request: &'a ChatCompletionRequest,
    stream: bool,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Streams one chat completion.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Cancelling `cancel` ends the call at its next suspension point with
    /// [`ZiweiError::Aborted`] delivered through `on_error`.
    async fn stream_chat(
        &self,
        endpoint: &Endpoint,
        request: &ChatCompletionRequest,
        handler: &mut dyn StreamHandler,
        cancel: &CancellationToken,
    );
}

/// [`ChatTransport`] over HTTP with an overall deadline per request.
#[derive(Clone)]
pub struct StreamingClient {
    client: Client,
    timeout: Duration,
}

impl StreamingClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    async fn send_and_decode(
        &self,
        endpoint: &Endpoint,
        request: &ChatCompletionRequest,
        handler: &mut dyn StreamHandler,
    ) -> Result<String> {
        let body = StreamingBody {
            request,
            stream: true,
        };

        let response = self
            .client
            .post(&endpoint.url)
            .bearer_auth(&endpoint.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| ZiweiError::network(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body_text));
        }

        decode_event_stream(response.bytes_stream(), handler).await
    }
}

impl Default for StreamingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for StreamingClient {
    async fn stream_chat(
        &self,
        endpoint: &Endpoint,
        request: &ChatCompletionRequest,
        handler: &mut dyn StreamHandler,
        cancel: &CancellationToken,
    ) {
        tracing::debug!(
            url = %endpoint.url,
            model = %request.model,
            messages = request.messages.len(),
            "Starting streamed completion"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ZiweiError::Aborted),
            _ = tokio::time::sleep(self.timeout) => Err(ZiweiError::Timeout(self.timeout)),
            result = self.send_and_decode(endpoint, request, &mut *handler) => result,
        };

        match outcome {
            Ok(full_content) => {
                tracing::debug!(chars = full_content.chars().count(), "Streamed completion finished");
                handler.on_complete(&full_content);
            }
            Err(error) => {
                tracing::warn!(%error, "Streamed completion failed");
                handler.on_error(error);
            }
        }
    }
}

/// Decodes an event stream into `on_token` calls and returns the full text.
///
/// Reads until the body ends. `data: [DONE]` carries no token and is
/// skipped; frames that are not valid JSON are dropped.
pub async fn decode_event_stream<S, B, E>(
    stream: S,
    handler: &mut dyn StreamHandler,
) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut buffer = SseLineBuffer::new();
    let mut full_content = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| ZiweiError::network(format!("stream interrupted: {err}")))?;
        for line in buffer.process_chunk(chunk.as_ref()) {
            deliver(&line, &mut full_content, handler);
        }
    }

    if let Some(line) = buffer.flush() {
        deliver(&line, &mut full_content, handler);
    }
    Ok(full_content)
}

fn deliver(line: &str, full_content: &mut String, handler: &mut dyn StreamHandler) {
    match parse_data_line(line) {
        DataLine::Delta(token) => {
            full_content.push_str(&token);
            handler.on_token(&token);
        }
        DataLine::Done => tracing::trace!("Stream terminator received"),
        DataLine::Skip => {}
    }
}

/// Lifts `error.message` out of an error body, falling back to the status.
pub fn error_from_body(status: u16, body: &str) -> ZiweiError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|wrapper| wrapper.error.message);
    ZiweiError::http(status, message)
}
