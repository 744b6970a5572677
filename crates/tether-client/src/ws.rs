//! WebSocket transport backed by `tokio-tungstenite`.
//!
//! The production deployment talks to a browser-facing WebSocket server;
//! this adapter maps the message-oriented [`Transport`] seam onto a
//! `ws://`/`wss://` client connection. Each frame travels as one text
//! message, matching the wire contract.

use std::io;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::transport::{Transport, TransportReceiver, TransportSender};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport that connects to a WebSocket server on open.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    /// Transport for the given `ws://` or `wss://` URL; the connection is
    /// established by [`Transport::open`].
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    type Sender = WebSocketSender;
    type Receiver = WebSocketReceiver;

    async fn open(self) -> io::Result<(Self::Sender, Self::Receiver)> {
        let (stream, _response) = connect_async(self.url).await.map_err(io::Error::other)?;
        let (sink, stream) = stream.split();
        Ok((WebSocketSender { sink }, WebSocketReceiver { stream }))
    }
}

/// Sending half of an open WebSocket connection.
pub struct WebSocketSender {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportSender for WebSocketSender {
    async fn send(&mut self, message: String) -> io::Result<()> {
        self.sink.send(Message::text(message)).await.map_err(io::Error::other)
    }
}

/// Receiving half of an open WebSocket connection.
pub struct WebSocketReceiver {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl TransportReceiver for WebSocketReceiver {
    async fn recv(&mut self) -> io::Result<Option<String>> {
        while let Some(message) = self.stream.next().await {
            match message.map_err(io::Error::other)? {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                Message::Close(_) => return Ok(None),
                // Pings and pongs are handled by tungstenite; binary frames
                // are outside the wire contract.
                _ => {}
            }
        }
        Ok(None)
    }
}
