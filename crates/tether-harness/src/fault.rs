//! Fault-injection transports.

use std::io;

use async_trait::async_trait;
use tether_client::Transport;

use crate::memory::{MemoryReceiver, MemorySender};

/// Transport whose open always fails, for connect-failure tests.
pub struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    type Sender = MemorySender;
    type Receiver = MemoryReceiver;

    async fn open(self) -> io::Result<(Self::Sender, Self::Receiver)> {
        Err(io::Error::new(io::ErrorKind::ConnectionRefused, "injected connect failure"))
    }
}
