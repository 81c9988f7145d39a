// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! WebSocket transport

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_wsocket::futures_util::{Sink, SinkExt, StreamExt, TryStreamExt};
use async_wsocket::{ConnectionMode, Message, WebSocket};
use nostr::util::BoxedFuture;

use super::{Socket, TransportError, WebSocketTransport};
use crate::url::RelayUrl;

/// Transport backed by `async-wsocket`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DefaultWebsocketTransport;

impl WebSocketTransport for DefaultWebsocketTransport {
    fn open<'a>(
        &'a self,
        url: &'a RelayUrl,
        mode: &'a ConnectionMode,
        timeout: Duration,
    ) -> BoxedFuture<'a, Result<Socket, TransportError>> {
        Box::pin(async move {
            let socket: WebSocket = WebSocket::connect(url.as_url(), mode, timeout)
                .await
                .map_err(TransportError::backend)?;

            let (sink, stream) = socket.split();

            // `sink_map_err` may panic after close, wrap the sink instead
            Ok(Socket::new(
                BackendSink { inner: sink },
                stream.map_err(TransportError::backend),
            ))
        })
    }
}

/// Maps the errors of a backend sink
struct BackendSink<S> {
    inner: S,
}

impl<S> Sink<Message> for BackendSink<S>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    type Error = TransportError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut()
            .inner
            .poll_ready_unpin(cx)
            .map_err(TransportError::backend)
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.get_mut()
            .inner
            .start_send_unpin(item)
            .map_err(TransportError::backend)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut()
            .inner
            .poll_flush_unpin(cx)
            .map_err(TransportError::backend)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.get_mut()
            .inner
            .poll_close_unpin(cx)
            .map_err(TransportError::backend)
    }
}
