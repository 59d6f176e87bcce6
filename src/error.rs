//! Error types for beanline.

use thiserror::Error;

/// Main error type for all beanline operations.
#[derive(Debug, Error)]
pub enum BeanlineError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (object-typed job payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error (statistics payloads).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Caller passed an invalid argument; raised at encode time,
    /// before any bytes are written.
    #[error("usage error: {0}")]
    Usage(String),

    /// The server answered with a recognized error token.
    /// Carries the raw status line, e.g. `NOT_FOUND`.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered with a line matching neither a known error token
    /// nor the expected success token for the command. Carries the raw line.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A job body was not valid UTF-8 where text was requested.
    #[error("job payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Connection closed while commands were awaiting their responses.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using BeanlineError.
pub type Result<T> = std::result::Result<T, BeanlineError>;
