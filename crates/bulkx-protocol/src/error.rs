//! Error types for envelope encoding and decoding.

use thiserror::Error;

/// Errors from reading or writing task envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid base64 in pipe result: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
