//! Wire format for the Tether synchronization protocol.
//!
//! Every unit of traffic is a [`Frame`]: the ordered triple
//! `(correlationId, topic, payload)`, encoded as the JSON array
//! `[correlationId, topic, payload]` and sent as one discrete text message
//! over the transport. The correlation id pairs a reply with its originating
//! send; the topic routes the frame to a handler; the payload is an arbitrary
//! JSON value whose shape depends on the topic.
//!
//! We chose a textual encoding because the peer is a browser runtime: JSON is
//! the one serialization both ends parse natively, and frames stay readable in
//! transport inspectors. Routing only ever touches the first two elements, so
//! the payload can remain an opaque [`serde_json::Value`] until a handler
//! interprets it.
//!
//! # Modules
//!
//! - [`frame`]: the frame triple and its JSON codec
//! - [`ids`]: correlation and component identifiers
//! - [`topics`]: the fixed control vocabulary and namespaced store topics
//! - [`payloads`]: typed payloads for each control topic, plus the RPC reply
//!   envelope
//! - [`errors`]: protocol error types
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod frame;
pub mod ids;
pub mod payloads;
pub mod topics;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use ids::{ComponentId, CorrelationId};
pub use payloads::{AddComponent, DestroyComponent, ExecRpc, RemoteError, RpcReply, StoreSet};
pub use topics::Topic;
