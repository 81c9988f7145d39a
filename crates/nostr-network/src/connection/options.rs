// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Connection options

use std::time::Duration;

use async_wsocket::ConnectionMode;

use super::constants::{
    DEFAULT_BOOT_GRACE, DEFAULT_CONNECTION_TIMEOUT, DEFAULT_NOTIFICATION_CHANNEL_SIZE,
    WAIT_FOR_AUTH_OK_TIMEOUT,
};

/// [`Connection`](super::Connection) options
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub(super) connection_mode: ConnectionMode,
    pub(super) connect_timeout: Duration,
    pub(super) boot_grace: Duration,
    pub(super) auth_timeout: Duration,
    pub(super) notification_channel_size: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connection_mode: ConnectionMode::default(),
            connect_timeout: DEFAULT_CONNECTION_TIMEOUT,
            boot_grace: DEFAULT_BOOT_GRACE,
            auth_timeout: WAIT_FOR_AUTH_OK_TIMEOUT,
            notification_channel_size: DEFAULT_NOTIFICATION_CHANNEL_SIZE,
        }
    }
}

impl ConnectionOptions {
    /// New default options
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set connection mode
    #[inline]
    pub fn connection_mode(mut self, mode: ConnectionMode) -> Self {
        self.connection_mode = mode;
        self
    }

    /// Socket connect timeout (default: 10 secs)
    #[inline]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Readiness gate grace period (default: 2 secs)
    #[inline]
    pub fn boot_grace(mut self, grace: Duration) -> Self {
        self.boot_grace = grace;
        self
    }

    /// How long to wait for the `OK` answering our AUTH event (default: 7 secs)
    #[inline]
    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Notification channel size (default: 2048)
    #[inline]
    pub fn notification_channel_size(mut self, size: usize) -> Self {
        self.notification_channel_size = size;
        self
    }
}
