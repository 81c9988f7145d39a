// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Error

use crate::connection;
use crate::message::MessageHandleError;
use crate::transport::TransportError;
use crate::url;

/// Network error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Relay URL error
    #[error(transparent)]
    RelayUrl(#[from] url::Error),
    /// Message handle error
    #[error(transparent)]
    MessageHandle(#[from] MessageHandleError),
    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Connection error
    #[error(transparent)]
    Connection(#[from] connection::Error),
}
