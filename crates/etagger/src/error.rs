//! Error types for the etagger crate.

use thiserror::Error;

/// Boxed error used for failures raised by host types (body streams, continuations).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for etagger operations.
pub type Result<T> = std::result::Result<T, EtagError>;

/// Errors that can occur while fingerprinting or configuring.
#[derive(Debug, Error)]
pub enum EtagError {
    /// The response body could not be read for fingerprinting
    #[error("Failed to read response body: {0}")]
    Body(#[source] BoxError),

    /// The downstream continuation failed to produce a response
    #[error("Downstream handler failed: {0}")]
    Upstream(#[source] BoxError),

    /// A header could not be written
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name
        name: String,
        /// Why the header was rejected
        reason: String,
    },

    /// A configured media type is outside the supported set
    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtagError {
    /// Wrap a body stream failure
    pub fn body(err: impl Into<BoxError>) -> Self {
        Self::Body(err.into())
    }

    /// Wrap a continuation failure
    pub fn upstream(err: impl Into<BoxError>) -> Self {
        Self::Upstream(err.into())
    }

    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
