// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Connection
//!
//! One socket to one relay URL. A connection is either direct (the URL is a
//! relay) or carries routed traffic for many relays (the URL is a
//! multiplexer).

use std::sync::Arc;

use nostr::Timestamp;
use tokio::sync::broadcast;

pub mod constants;
mod error;
mod gate;
mod inner;
pub mod options;
pub mod stats;
mod status;

pub use self::error::Error;
pub use self::gate::{GateOpenReason, ReadinessGate};
use self::inner::InnerConnection;
pub use self::options::ConnectionOptions;
pub use self::stats::ConnectionStats;
pub use self::status::ConnectionStatus;
use crate::message::{ClientMessage, RelayMessage};
use crate::shared::SharedState;
use crate::url::RelayUrl;

/// Connection notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionNotification {
    /// Received a message
    Message {
        /// Origin relay (the connection URL, or the routed relay on a multiplexer)
        relay_url: RelayUrl,
        /// Relay message
        message: RelayMessage,
    },
    /// Connection status changed
    Status {
        /// Status
        status: ConnectionStatus,
    },
    /// Authenticated to relay
    Authenticated {
        /// Relay URL
        relay_url: RelayUrl,
    },
    /// Authentication failed
    AuthenticationFailed {
        /// Relay URL
        relay_url: RelayUrl,
    },
}

/// Connection
#[derive(Debug, Clone)]
pub struct Connection {
    inner: Arc<InnerConnection>,
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Connection {}

impl Connection {
    pub(crate) fn new(url: RelayUrl, state: SharedState, opts: ConnectionOptions) -> Self {
        Self {
            inner: Arc::new(InnerConnection::new(url, state, opts)),
        }
    }

    /// Get connection url
    #[inline]
    pub fn url(&self) -> &RelayUrl {
        &self.inner.url
    }

    /// Get status
    #[inline]
    pub fn status(&self) -> ConnectionStatus {
        self.inner.status()
    }

    /// Get connection stats
    #[inline]
    pub fn stats(&self) -> &ConnectionStats {
        &self.inner.stats
    }

    /// Get readiness gate
    #[inline]
    pub fn gate(&self) -> &ReadinessGate {
        &self.inner.gate
    }

    /// Last inbound or outbound traffic
    #[inline]
    pub fn last_activity(&self) -> Option<Timestamp> {
        self.inner.stats.last_activity()
    }

    /// Check if an error is currently recorded
    #[inline]
    pub fn has_error(&self) -> bool {
        self.inner.stats.last_error().is_some()
    }

    /// Clear the error flag
    #[inline]
    pub fn clear_error(&self) {
        self.inner.stats.clear_error();
    }

    /// Get new connection notification listener
    ///
    /// Only notifications sent after this call are received.
    #[inline]
    pub fn notifications(&self) -> broadcast::Receiver<ConnectionNotification> {
        self.inner.notification_sender.subscribe()
    }

    /// Open the socket
    ///
    /// Returns immediately if already open. If another task is already
    /// connecting, waits for it and reports its outcome.
    pub async fn connect(&self) -> Result<(), Error> {
        match self.inner.connect_lock.try_lock() {
            Ok(_guard) => {
                if self.status().is_open() {
                    return Ok(());
                }

                self.inner.try_connect().await
            }
            Err(..) => {
                let _guard = self.inner.connect_lock.lock().await;

                if self.status().is_open() {
                    Ok(())
                } else {
                    Err(Error::NotConnected)
                }
            }
        }
    }

    /// Close the socket
    #[inline]
    pub fn disconnect(&self) {
        self.inner.disconnect()
    }

    /// Queue a message for the connection URL
    #[inline]
    pub fn send_msg(&self, msg: &ClientMessage) -> Result<(), Error> {
        self.inner.send_routed(&[], msg)
    }

    /// Queue a message for `relays`
    ///
    /// Wrapped in a routing envelope unless the only relay is the connection URL.
    #[inline]
    pub fn send_routed(&self, relays: &[RelayUrl], msg: &ClientMessage) -> Result<(), Error> {
        self.inner.send_routed(relays, msg)
    }
}
