//! In-memory transport pair.
//!
//! [`memory_pair`] yields a client half implementing the runtime's
//! [`Transport`] seam and a peer half that tests (or [`crate::SimServer`])
//! drive directly. Messages are delivered in order over unbounded channels;
//! dropping the peer half closes the client's receive stream, which the
//! router observes as a graceful peer close.

use std::io;

use async_trait::async_trait;
use tether_client::{Transport, TransportReceiver, TransportSender};
use tether_proto::Frame;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Create a connected in-memory transport pair.
pub fn memory_pair() -> (MemoryTransport, PeerEndpoint) {
    let (client_sender, peer_receiver) = mpsc::unbounded_channel();
    let (peer_sender, client_receiver) = mpsc::unbounded_channel();
    (
        MemoryTransport { sender: client_sender, receiver: client_receiver },
        PeerEndpoint { sender: peer_sender, receiver: peer_receiver },
    )
}

/// Client half of an in-memory connection.
pub struct MemoryTransport {
    sender: UnboundedSender<String>,
    receiver: UnboundedReceiver<String>,
}

#[async_trait]
impl Transport for MemoryTransport {
    type Sender = MemorySender;
    type Receiver = MemoryReceiver;

    async fn open(self) -> io::Result<(Self::Sender, Self::Receiver)> {
        Ok((MemorySender { sender: self.sender }, MemoryReceiver { receiver: self.receiver }))
    }
}

/// Sending half of the client's in-memory connection.
pub struct MemorySender {
    sender: UnboundedSender<String>,
}

#[async_trait]
impl TransportSender for MemorySender {
    async fn send(&mut self, message: String) -> io::Result<()> {
        self.sender
            .send(message)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer endpoint dropped"))
    }
}

/// Receiving half of the client's in-memory connection.
pub struct MemoryReceiver {
    receiver: UnboundedReceiver<String>,
}

#[async_trait]
impl TransportReceiver for MemoryReceiver {
    async fn recv(&mut self) -> io::Result<Option<String>> {
        Ok(self.receiver.recv().await)
    }
}

/// The peer's raw view of the connection.
pub struct PeerEndpoint {
    sender: UnboundedSender<String>,
    receiver: UnboundedReceiver<String>,
}

impl PeerEndpoint {
    /// Send a frame to the client. Returns `false` if the client is gone.
    pub fn send_frame(&self, frame: &Frame) -> bool {
        match frame.encode() {
            Ok(text) => self.sender.send(text).is_ok(),
            Err(_) => false,
        }
    }

    /// Send raw text, bypassing the codec (for malformed-frame injection).
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.sender.send(text.into()).is_ok()
    }

    /// Receive the next frame sent by the client.
    ///
    /// Skips (and logs) undecodable text; resolves to `None` when the
    /// client half is gone.
    pub async fn recv_frame(&mut self) -> Option<Frame> {
        loop {
            let text = self.receiver.recv().await?;
            match Frame::decode(&text) {
                Ok(frame) => return Some(frame),
                Err(error) => tracing::warn!(%error, "peer received undecodable text"),
            }
        }
    }

    /// Close the connection from the peer side.
    pub fn close(self) {
        drop(self);
    }
}
