// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Transport
//!
//! Connections never touch the network directly: they ask a
//! [`WebSocketTransport`] for a [`Socket`] and own it until it closes.

use std::fmt;
use std::time::Duration;

use async_wsocket::futures_util::{Sink, Stream};
use async_wsocket::{ConnectionMode, Message};
use nostr::util::BoxedFuture;

pub mod error;
pub mod websocket;

pub use self::error::TransportError;
pub use self::websocket::DefaultWebsocketTransport;
use crate::url::RelayUrl;

/// Outgoing half of a socket
pub type BoxSink = Box<dyn Sink<Message, Error = TransportError> + Send + Unpin>;
/// Incoming half of a socket
pub type BoxStream = Box<dyn Stream<Item = Result<Message, TransportError>> + Send + Unpin>;

/// Open socket
pub struct Socket {
    /// Frames to the relay
    pub sink: BoxSink,
    /// Frames from the relay
    pub stream: BoxStream,
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket").finish_non_exhaustive()
    }
}

impl Socket {
    /// Box both halves
    pub fn new<S, R>(sink: S, stream: R) -> Self
    where
        S: Sink<Message, Error = TransportError> + Send + Unpin + 'static,
        R: Stream<Item = Result<Message, TransportError>> + Send + Unpin + 'static,
    {
        Self {
            sink: Box::new(sink),
            stream: Box::new(stream),
        }
    }
}

/// Socket factory
pub trait WebSocketTransport: fmt::Debug + Send + Sync {
    /// Open a new socket to `url`
    ///
    /// Every call opens a distinct socket.
    fn open<'a>(
        &'a self,
        url: &'a RelayUrl,
        mode: &'a ConnectionMode,
        timeout: Duration,
    ) -> BoxedFuture<'a, Result<Socket, TransportError>>;
}
