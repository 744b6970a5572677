//! Protocol error types.

use thiserror::Error;

/// Errors produced while encoding, decoding, or interpreting frames.
///
/// A malformed inbound frame is never fatal to the connection: the router
/// records it and drops it, and processing continues with the next frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The frame text was not a well-formed `[correlationId, topic, payload]`
    /// array (invalid JSON, wrong arity, or wrong element types).
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// A frame's payload did not match the shape its topic requires.
    #[error("invalid payload for topic {topic}: {reason}")]
    BadPayload {
        /// Topic whose payload contract was violated.
        topic: String,
        /// What was wrong with the payload.
        reason: String,
    },
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
