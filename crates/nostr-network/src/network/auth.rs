// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay authentication

use std::fmt;

use nostr::util::BoxedFuture;
use nostr::{Event, EventBuilder, Keys};

use crate::url::RelayUrl;

/// Per-relay authentication state
///
/// Absent while the relay never asked us to authenticate, or after a
/// successful handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFlag {
    /// Relay sent an AUTH challenge, handshake not completed
    Unauthorized,
    /// Relay rejected our AUTH event
    Forbidden,
}

impl fmt::Display for AuthFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
        }
    }
}

/// Answers relay AUTH challenges
pub trait AuthHandler: fmt::Debug + Send + Sync {
    /// Build the signed AUTH event for `challenge`
    ///
    /// Return `None` to decline.
    fn authenticate<'a>(
        &'a self,
        relay_url: &'a RelayUrl,
        challenge: &'a str,
    ) -> BoxedFuture<'a, Option<Event>>;
}

/// [`AuthHandler`] signing with local keys
#[derive(Debug, Clone)]
pub struct KeysAuthHandler {
    keys: Keys,
}

impl KeysAuthHandler {
    /// New handler
    #[inline]
    pub fn new(keys: Keys) -> Self {
        Self { keys }
    }
}

impl AuthHandler for KeysAuthHandler {
    fn authenticate<'a>(
        &'a self,
        relay_url: &'a RelayUrl,
        challenge: &'a str,
    ) -> BoxedFuture<'a, Option<Event>> {
        Box::pin(async move {
            let relay: nostr::RelayUrl = match nostr::RelayUrl::parse(relay_url.as_str()) {
                Ok(relay) => relay,
                Err(e) => {
                    tracing::warn!(url = %relay_url, error = %e, "Can't use relay url in AUTH event.");
                    return None;
                }
            };

            match EventBuilder::auth(challenge, relay).sign_with_keys(&self.keys) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::error!(url = %relay_url, error = %e, "Can't sign AUTH event.");
                    None
                }
            }
        })
    }
}
