//! Streaming transport to OpenAI-compatible chat-completion endpoints.

pub mod provider;
pub mod sse;
pub mod streaming;

pub use provider::ProviderTarget;
pub use streaming::{
    ChatCompletionRequest, ChatTransport, Endpoint, RequestMessage, StreamHandler,
    StreamingClient, decode_event_stream, error_from_body,
};
