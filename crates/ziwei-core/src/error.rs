//! Error types for the Ziwei pipeline.

use std::time::Duration;
use thiserror::Error;

/// A shared error type for every crate in the workspace.
///
/// Transport variants render as the bare message because the orchestrator
/// embeds them verbatim into user-visible text (`分析失败: {message}`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZiweiError {
    /// Malformed or out-of-range birth input, rejected at the form boundary.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// The ephemeris collaborator failed or produced an unusable chart.
    #[error("Ephemeris unavailable: {0}")]
    EphemerisUnavailable(String),

    /// Non-success HTTP status from an LLM endpoint.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Connection or read failure while talking to an LLM endpoint.
    #[error("{0}")]
    Network(String),

    /// The caller cancelled the in-flight request.
    #[error("request aborted")]
    Aborted,

    /// The overall request deadline elapsed.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// A request of the same mode is already streaming.
    #[error("a {0} request is already in flight")]
    Busy(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system or child process)
    #[error("IO error: {message}")]
    Io { message: String },
}

impl ZiweiError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn input(message: impl Into<String>) -> Self {
        Self::InputValidation(message.into())
    }

    pub fn ephemeris(message: impl Into<String>) -> Self {
        Self::EphemerisUnavailable(message.into())
    }

    /// Builds the error for a non-success response, falling back to the
    /// status code when the body carried no `error.message`.
    pub fn http(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        Self::Http { status, message }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_input_validation(&self) -> bool {
        matches!(self, Self::InputValidation(_))
    }

    pub fn is_ephemeris_unavailable(&self) -> bool {
        matches!(self, Self::EphemerisUnavailable(_))
    }

    /// True for user cancellation and deadline expiry.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted | Self::Timeout(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ZiweiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ZiweiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ZiweiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ZiweiError>`.
pub type Result<T> = std::result::Result<T, ZiweiError>;
