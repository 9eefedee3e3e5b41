//! Error types for the service client.

use thiserror::Error;

/// Errors that can occur when talking to the remote task service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to reach the service.
    #[error("connection failed: {0}")]
    Connection(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Map a reqwest error, separating "could not reach the service" from
    /// other transport failures.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Connection(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}
