//! Runtime error types.

use std::time::Duration;

use tether_proto::{ComponentId, ProtocolError};
use thiserror::Error;

/// Errors surfaced by the client runtime.
///
/// Malformed inbound frames and unroutable topics are deliberately absent:
/// the former are recorded and dropped, the latter are expected transient
/// races and ignored. Only conditions a caller can act on become errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport failed to open, or failed while reading or writing.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The connection closed while an operation was in flight.
    #[error("connection closed")]
    ConnectionClosed,

    /// The transport opened but the `app-state` handshake frame never
    /// arrived.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// The configured reply deadline passed with no correlated frame; the
    /// pending entry was evicted.
    #[error("rpc timed out after {0:?}")]
    RpcTimeout(Duration),

    /// The remote operation ran and reported a failure.
    #[error("remote operation failed: {kind}: {message}")]
    RemoteOperation {
        /// Remote error class.
        kind: String,
        /// Remote error description.
        message: String,
    },

    /// A locally produced frame or payload violated the wire contract.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A component with this id already exists in the session.
    #[error("component {0} already exists")]
    DuplicateComponent(ComponentId),

    /// This id belonged to a destroyed component; ids are never reused
    /// within a session.
    #[error("component id {0} was destroyed and must not be reused")]
    RetiredComponent(ComponentId),

    /// No live component has this id.
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),
}

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, ClientError>;
