//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding inbound traffic.
///
/// None of these are fatal: the controller turns each one into an `ack`
/// with `ok: false` addressed to the sender only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Payload exceeds [`crate::MAX_MESSAGE_SIZE`]
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Received payload size
        size: usize,
        /// Maximum accepted size
        max: usize,
    },

    /// Payload is not a well-formed JSON object
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// JSON object has no `type` field
    #[error("missing type")]
    MissingType,

    /// `type` names no known command
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Fragmented or non-text frame
    #[error("unsupported frame")]
    UnsupportedFrame,

    /// Outbound message could not be serialized
    #[error("encode failed: {0}")]
    Encode(String),
}

impl ProtocolError {
    /// Short human-readable reason carried in the `detail` field of an ack.
    pub fn detail(&self) -> String {
        match self {
            Self::PayloadTooLarge { .. } => "payload too large".to_string(),
            Self::Malformed(reason) | Self::Encode(reason) => reason.clone(),
            Self::MissingType => "missing type".to_string(),
            Self::UnknownType(_) => "unknown type".to_string(),
            Self::UnsupportedFrame => "unsupported frame".to_string(),
        }
    }
}
