//! Error types for oracle-select
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::protocol::Message;

/// Result type alias using SelectError
pub type Result<T> = std::result::Result<T, SelectError>;

/// Unified error type for oracle-select operations
#[derive(Debug, Error)]
pub enum SelectError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    // -------------------------------------------------------------------------
    // Decode Errors
    // -------------------------------------------------------------------------
    #[error("Unknown message variant: {0:?}")]
    UnknownVariant(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Protocol violation: {reason} (offending message: {message})")]
    ProtocolViolation { message: Message, reason: String },

    #[error("Session not found: {0}")]
    SessionNotFound(u32),

    #[error("Cannot select from an empty sequence")]
    EmptySequence,

    #[error("Too many live sessions (max {0})")]
    CapacityExceeded(usize),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote error: {0}")]
    Remote(String),
}

impl SelectError {
    /// Build a `ProtocolViolation` for `message`
    pub fn violation(message: Message, reason: impl Into<String>) -> Self {
        SelectError::ProtocolViolation {
            message,
            reason: reason.into(),
        }
    }

    /// True for failures raised below the protocol (network, framing, remote errors)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SelectError::Io(_)
                | SelectError::Timeout(_)
                | SelectError::Transport(_)
                | SelectError::Remote(_)
        )
    }
}
