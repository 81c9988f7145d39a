// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay set

use std::collections::HashSet;

use crate::url::RelayUrl;

/// Non-fatal problem found while normalizing a caller-supplied relay list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaySetIssue {
    /// No relays were supplied
    Empty,
    /// Some URLs collapsed to the same normalized identity
    Duplicates {
        /// Number of dropped duplicates
        dropped: usize,
    },
    /// URL that can't be parsed as a relay URL
    Invalid {
        /// Raw URL
        url: String,
        /// Parse error
        error: String,
    },
}

/// Normalized, deduplicated relay list
///
/// Order follows the first occurrence of each relay in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySet {
    urls: Vec<RelayUrl>,
    issues: Vec<RelaySetIssue>,
}

impl RelaySet {
    /// Normalize a list of raw relay URLs
    pub fn new<I, S>(relays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut issues: Vec<RelaySetIssue> = Vec::new();
        let mut parsed: Vec<RelayUrl> = Vec::new();

        for url in relays.into_iter() {
            let url: &str = url.as_ref();
            match RelayUrl::parse(url) {
                Ok(u) => parsed.push(u),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Ignoring invalid relay url.");
                    issues.push(RelaySetIssue::Invalid {
                        url: url.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Self::with_issues(parsed, issues)
    }

    /// Build from already parsed URLs
    pub fn from_urls<I>(urls: I) -> Self
    where
        I: IntoIterator<Item = RelayUrl>,
    {
        Self::with_issues(urls.into_iter().collect(), Vec::new())
    }

    fn with_issues(parsed: Vec<RelayUrl>, mut issues: Vec<RelaySetIssue>) -> Self {
        let total: usize = parsed.len();
        let mut seen: HashSet<RelayUrl> = HashSet::with_capacity(total);
        let mut urls: Vec<RelayUrl> = Vec::with_capacity(total);

        for url in parsed.into_iter() {
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }

        if urls.is_empty() {
            tracing::error!("Attempted to connect to zero relays.");
            issues.push(RelaySetIssue::Empty);
        }

        let dropped: usize = total - urls.len();
        if dropped > 0 {
            tracing::warn!(dropped = %dropped, "Attempted to connect to non-unique relays.");
            issues.push(RelaySetIssue::Duplicates { dropped });
        }

        Self { urls, issues }
    }

    /// Relay URLs
    #[inline]
    pub fn urls(&self) -> &[RelayUrl] {
        &self.urls
    }

    /// Consume into the relay URLs
    #[inline]
    pub fn into_urls(self) -> Vec<RelayUrl> {
        self.urls
    }

    /// Problems found while normalizing
    #[inline]
    pub fn issues(&self) -> &[RelaySetIssue] {
        &self.issues
    }

    /// Number of relays
    #[inline]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Check if set is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Check if any duplicate was dropped
    pub fn has_duplicates(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i, RelaySetIssue::Duplicates { .. }))
    }
}
