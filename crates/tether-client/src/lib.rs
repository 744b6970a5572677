//! Client-side runtime for the Tether synchronization protocol.
//!
//! Binds a server-resident object graph and a local UI layer into one
//! live-updating application over a single persistent bidirectional
//! connection. One ordered stream of [`tether_proto::Frame`]s carries three
//! interaction patterns: request/response RPC, continuous reactive-value
//! push, and lifecycle events for a dynamically created and destroyed
//! component hierarchy.
//!
//! # Architecture
//!
//! The [`Router`] is the sole owner of the transport. Everything else is a
//! client of its two primitives: register a topic handler, and send a frame
//! (optionally awaiting its correlated reply). The [`ComponentRegistry`]
//! creates [`Store`]s and [`RpcProxy`]s per component instance; neither ever
//! touches the transport directly.
//!
//! Inbound frames are processed strictly sequentially by one reader task, so
//! the pending-call table and the handler registry see a single logical
//! thread of events; their mutex guards exist only because the runtime may
//! move that thread across workers. Handlers and subscribers are invoked
//! outside any lock so they may freely call back into the runtime.
//!
//! # Components
//!
//! - [`queue`]: ordered producer/consumer hand-off primitive
//! - [`router`]: transport owner, demultiplexer, pending-call correlation
//! - [`registry`]: live component instances and their lifecycle
//! - [`store`]: per-instance reactive value cells
//! - [`rpc`]: remote operations as local async calls
//! - [`diagnostics`]: bounded log of every frame crossing the router
//! - [`transport`]: the seam to the hosting environment's connection
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod component;
pub mod diagnostics;
pub mod error;
pub mod queue;
pub mod registry;
pub mod router;
pub mod rpc;
pub mod store;
pub mod transport;

#[cfg(feature = "transport")]
pub mod ws;

pub use component::Component;
pub use diagnostics::{DiagnosticsBuffer, DiagnosticsConfig, Direction, FrameRecord, LogEntry};
pub use error::{ClientError, Result};
pub use queue::AsyncQueue;
pub use registry::{ComponentRegistry, Origin};
pub use router::{PendingReply, Router, RouterConfig};
pub use rpc::RpcProxy;
pub use store::Store;
pub use transport::{Transport, TransportReceiver, TransportSender};

#[cfg(feature = "transport")]
pub use ws::WebSocketTransport;
