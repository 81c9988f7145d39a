// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Transport error

/// Transport error
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Socket backend failure
    #[error("{0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
    /// Relay refused the connection
    #[error("'{0}' is unreachable")]
    Unreachable(String),
}

impl TransportError {
    /// Wrap a backend error
    #[inline]
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(error))
    }
}
