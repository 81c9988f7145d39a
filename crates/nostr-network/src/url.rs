// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay URL
//!
//! A [`RelayUrl`] is the identity key of a relay everywhere in this crate.
//! Two URLs that denote the same endpoint normalize to the same value:
//!
//! - scheme and host are lowercased
//! - default ports are dropped (`80` for `ws`, `443` for `wss`)
//! - trailing slashes and fragments are removed
//! - path and query are preserved
//!
//! `nostr::RelayUrl` is not used as the key: it compares the parsed URL as
//! is, so a trailing slash on a non-root path or a fragment makes a distinct
//! relay (`wss://r.example/nostr` and `wss://r.example/nostr/` would be two
//! pool entries). Convert with [`RelayUrl::as_str`] where a `nostr` API needs
//! its own type, e.g. AUTH events.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// Relay URL error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Url parse error
    #[error(transparent)]
    Parse(#[from] url::ParseError),
    /// Not a websocket URL
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Normalized relay URL
#[derive(Clone)]
pub struct RelayUrl {
    url: Url,
    normalized: String,
}

impl RelayUrl {
    /// Parse and normalize a relay URL
    pub fn parse(url: &str) -> Result<Self, Error> {
        let mut url: Url = Url::parse(url.trim())?;

        match url.scheme() {
            "ws" | "wss" => {}
            scheme => return Err(Error::UnsupportedScheme(scheme.to_string())),
        }

        url.set_fragment(None);

        // `Url` already lowercases scheme and host and drops default ports
        let mut normalized: String = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }

        Ok(Self { url, normalized })
    }

    /// Normalized string form
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Parsed URL, used to open the socket
    #[inline]
    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Debug for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RelayUrl").field(&self.normalized).finish()
    }
}

impl fmt::Display for RelayUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

impl PartialEq for RelayUrl {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for RelayUrl {}

impl PartialOrd for RelayUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelayUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl Hash for RelayUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl FromStr for RelayUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RelayUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.normalized)
    }
}

impl<'de> Deserialize<'de> for RelayUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let url: String = String::deserialize(deserializer)?;
        Self::parse(&url).map_err(serde::de::Error::custom)
    }
}
