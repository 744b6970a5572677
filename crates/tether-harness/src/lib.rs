//! Deterministic test harness for the Tether protocol.
//!
//! In-memory implementations of the transport seam plus a scripted peer that
//! speaks the server's observable framing contract, so the full client
//! runtime can be exercised end-to-end without sockets, timers, or real
//! servers.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fault;
pub mod memory;
pub mod peer;

pub use fault::FailingTransport;
pub use memory::{MemoryTransport, PeerEndpoint, memory_pair};
pub use peer::{MirrorComponent, SimServer, SimServerHandle};

/// Install an env-filtered tracing subscriber writing to the test capture.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
