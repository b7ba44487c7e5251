//! Bridge transport errors.

use std::io;
use thiserror::Error;

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur talking to a catalog bridge process.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Failed to spawn the bridge process.
    #[error("failed to spawn catalog bridge: {0}")]
    SpawnFailed(#[source] io::Error),

    /// Failed to write to bridge stdin.
    #[error("failed to write to catalog bridge: {0}")]
    WriteFailed(#[source] io::Error),

    /// Failed to serialize request to JSON.
    #[error("failed to serialize request: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// Failed to deserialize response from JSON.
    #[error("failed to deserialize response: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    /// Request timed out waiting for response.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Response channel was closed; the bridge went away.
    #[error("catalog bridge exited unexpectedly")]
    ChannelClosed,

    /// Bridge returned an error response.
    #[error("catalog error: {message} (code: {code})")]
    Remote {
        /// Error code from the bridge.
        code: String,
        /// Error message from the bridge.
        message: String,
    },

    /// The bridge could not reach its catalog.
    #[error("catalog connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Method not supported by the bridge.
    #[error("method not found: {0}")]
    MethodNotFound(String),
}

impl BridgeError {
    /// Create a remote error from an error response.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for BridgeError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}
