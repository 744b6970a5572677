//! Transport abstraction for the hosting environment's connection.
//!
//! The runtime does not open sockets itself: the host supplies something that
//! can carry discrete text messages in both directions (a WebSocket in the
//! browser-facing deployment, an in-memory channel pair under test). The
//! trait splits an opened connection into independent send and receive
//! halves so the router can drive them from separate tasks.

use std::io;

use async_trait::async_trait;

/// A connection that can be opened once and split into halves.
///
/// Opening suspends until the transport's open event fires; a transport that
/// cannot connect reports the failure here, and the router surfaces it to
/// the `connect` caller without retrying.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Sending half produced by [`Transport::open`].
    type Sender: TransportSender;

    /// Receiving half produced by [`Transport::open`].
    type Receiver: TransportReceiver;

    /// Open the connection and split it.
    async fn open(self) -> io::Result<(Self::Sender, Self::Receiver)>;
}

/// Outbound half of an open connection.
#[async_trait]
pub trait TransportSender: Send + 'static {
    /// Send one encoded frame as one discrete message.
    async fn send(&mut self, message: String) -> io::Result<()>;
}

/// Inbound half of an open connection.
#[async_trait]
pub trait TransportReceiver: Send + 'static {
    /// Receive the next discrete message.
    ///
    /// Resolves to `Ok(None)` when the peer closed the connection
    /// gracefully; transport faults are `Err`.
    async fn recv(&mut self) -> io::Result<Option<String>>;
}
