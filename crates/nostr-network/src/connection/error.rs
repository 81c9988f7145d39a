// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use crate::message::MessageHandleError;
use crate::transport::TransportError;

/// [`Connection`](super::Connection) error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// MessageHandle error
    #[error(transparent)]
    MessageHandle(#[from] MessageHandleError),
    /// Generic timeout
    #[error("timeout")]
    Timeout,
    /// Can't queue message
    #[error("Can't send message to the '{channel}' channel")]
    CantSendChannelMessage {
        /// Name of channel
        channel: String,
    },
    /// Socket not open
    #[error("relay not connected")]
    NotConnected,
    /// Connection terminated while waiting
    #[error("connection terminated")]
    Terminated,
    /// No auth handler set
    #[error("auth handler not configured")]
    AuthHandlerNotConfigured,
    /// Auth handler returned no event
    #[error("auth handler declined the challenge")]
    AuthDeclined,
    /// Relay rejected the AUTH event
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
}
