// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Connection status

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug)]
pub(super) struct AtomicConnectionStatus {
    value: AtomicU8,
}

impl Default for AtomicConnectionStatus {
    fn default() -> Self {
        Self::new(ConnectionStatus::New)
    }
}

impl AtomicConnectionStatus {
    #[inline]
    pub(super) fn new(status: ConnectionStatus) -> Self {
        Self {
            value: AtomicU8::new(status as u8),
        }
    }

    #[inline]
    pub(super) fn set(&self, status: ConnectionStatus) {
        self.value.store(status as u8, Ordering::SeqCst);
    }

    pub(super) fn load(&self) -> ConnectionStatus {
        match self.value.load(Ordering::SeqCst) {
            0 => ConnectionStatus::New,
            1 => ConnectionStatus::Connecting,
            2 => ConnectionStatus::Open,
            3 => ConnectionStatus::Closed,
            _ => ConnectionStatus::Error,
        }
    }
}

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConnectionStatus {
    /// Created, never connected
    New = 0,
    /// Opening the socket
    Connecting = 1,
    /// Socket open
    Open = 2,
    /// Socket closed cleanly
    Closed = 3,
    /// Socket failed to open or broke
    Error = 4,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "New"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
            Self::Error => write!(f, "Error"),
        }
    }
}

impl ConnectionStatus {
    /// Check if is [`ConnectionStatus::Open`]
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Check if is [`ConnectionStatus::Connecting`]
    #[inline]
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Check if is [`ConnectionStatus::Closed`]
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check if a new socket must be opened before use (`New`, `Closed` or `Error`)
    #[inline]
    pub fn needs_connect(&self) -> bool {
        matches!(self, Self::New | Self::Closed | Self::Error)
    }
}
