// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay metadata

use std::collections::HashMap;
use std::fmt;

use crate::url::RelayUrl;

/// Relay limitations, as advertised in its information document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelayLimitation {
    /// Relay requires AUTH before serving requests
    pub auth_required: bool,
    /// Relay requires payment
    pub payment_required: bool,
}

impl RelayLimitation {
    /// Check if operations must wait for the readiness gate
    #[inline]
    pub fn is_gated(&self) -> bool {
        self.auth_required || self.payment_required
    }
}

/// Source of per-relay metadata
pub trait RelayMetadata: fmt::Debug + Send + Sync {
    /// Limitations of `relay_url`
    fn limitation(&self, relay_url: &RelayUrl) -> RelayLimitation;
}

/// No relay has limitations
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelayMetadata;

impl RelayMetadata for NoRelayMetadata {
    #[inline]
    fn limitation(&self, _relay_url: &RelayUrl) -> RelayLimitation {
        RelayLimitation::default()
    }
}

/// Fixed relay limitations
#[derive(Debug, Clone, Default)]
pub struct StaticRelayMetadata {
    limitations: HashMap<RelayUrl, RelayLimitation>,
}

impl StaticRelayMetadata {
    /// Empty metadata
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set limitation of a relay
    pub fn with_limitation(mut self, relay_url: RelayUrl, limitation: RelayLimitation) -> Self {
        self.limitations.insert(relay_url, limitation);
        self
    }
}

impl RelayMetadata for StaticRelayMetadata {
    fn limitation(&self, relay_url: &RelayUrl) -> RelayLimitation {
        self.limitations.get(relay_url).copied().unwrap_or_default()
    }
}
