//! Core domain errors.

use thiserror::Error;

/// Core domain errors for mediaq.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Status string reported by the remote service is not recognised.
    #[error("Unknown remote status: {0}")]
    UnknownStatus(String),

    /// Media kind string is not recognised.
    #[error("Unknown media kind: {0}")]
    UnknownMediaKind(String),

    /// Quality tier does not exist for the given media kind.
    #[error("Invalid quality '{quality}' for {kind}")]
    UnknownQuality { kind: String, quality: String },
}
