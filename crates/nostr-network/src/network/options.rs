// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Network options

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::progress::PublishProgress;
use super::subscription::SeenEvent;
use crate::executor::PublishVerb;
use crate::relay_set::RelaySet;
use crate::url::RelayUrl;

pub(super) const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_millis(3000);
pub(super) const DEFAULT_COUNT_TIMEOUT: Duration = Duration::from_millis(3000);

const MULTIPLEXER_URL_VAR: &str = "NOSTR_MULTIPLEXER_URL";
const COUNT_RELAYS_VAR: &str = "NOSTR_COUNT_RELAYS";
const FORCE_RELAYS_VAR: &str = "NOSTR_FORCE_RELAYS";

/// [`Network`](super::Network) options
#[derive(Debug, Clone)]
pub struct NetworkOptions {
    pub(super) multiplexer_url: Option<RelayUrl>,
    pub(super) count_relays: Vec<RelayUrl>,
    pub(super) force_relays: Vec<RelayUrl>,
    pub(super) publish_timeout: Duration,
    pub(super) count_timeout: Duration,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            multiplexer_url: None,
            count_relays: Vec::new(),
            force_relays: Vec::new(),
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            count_timeout: DEFAULT_COUNT_TIMEOUT,
        }
    }
}

impl NetworkOptions {
    /// New default options
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from the environment
    ///
    /// - `NOSTR_MULTIPLEXER_URL`: multiplexer URL, empty disables multiplexing
    /// - `NOSTR_COUNT_RELAYS`: comma separated relays used by [`Network::count`](super::Network::count)
    /// - `NOSTR_FORCE_RELAYS`: comma separated relays replacing every caller relay set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let multiplexer_url: Option<RelayUrl> = lookup(MULTIPLEXER_URL_VAR)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .and_then(|url| match RelayUrl::parse(&url) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Ignoring invalid multiplexer url.");
                    None
                }
            });

        let count_relays: Vec<RelayUrl> = parse_list(lookup(COUNT_RELAYS_VAR));
        let force_relays: Vec<RelayUrl> = parse_list(lookup(FORCE_RELAYS_VAR));

        tracing::info!(
            multiplexer = ?multiplexer_url.as_ref().map(|u| u.as_str()),
            count_relays = %count_relays.len(),
            force_relays = %force_relays.len(),
            "Loaded network configuration."
        );

        Self {
            multiplexer_url,
            count_relays,
            force_relays,
            ..Default::default()
        }
    }

    /// Multiplexer URL (default: none)
    #[inline]
    pub fn multiplexer_url(mut self, url: Option<RelayUrl>) -> Self {
        self.multiplexer_url = url;
        self
    }

    /// Relays used by [`Network::count`](super::Network::count)
    pub fn count_relays<I>(mut self, relays: I) -> Self
    where
        I: IntoIterator<Item = RelayUrl>,
    {
        self.count_relays = relays.into_iter().collect();
        self
    }

    /// Relays replacing every caller relay set, when non-empty
    pub fn force_relays<I>(mut self, relays: I) -> Self
    where
        I: IntoIterator<Item = RelayUrl>,
    {
        self.force_relays = relays.into_iter().collect();
        self
    }

    /// Default publish timeout (default: 3 secs)
    #[inline]
    pub fn publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Count timeout (default: 3 secs)
    #[inline]
    pub fn count_timeout(mut self, timeout: Duration) -> Self {
        self.count_timeout = timeout;
        self
    }
}

fn parse_list(value: Option<String>) -> Vec<RelayUrl> {
    let value: String = value.unwrap_or_default();
    let urls: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .collect();

    if urls.is_empty() {
        return Vec::new();
    }

    RelaySet::new(urls).into_urls()
}

type ProgressCallback = Arc<dyn Fn(&PublishProgress) + Send + Sync>;

/// Publish options
#[derive(Clone, Default)]
pub struct PublishOptions {
    pub(super) timeout: Option<Duration>,
    pub(super) verb: PublishVerb,
    pub(super) on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for PublishOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishOptions")
            .field("timeout", &self.timeout)
            .field("verb", &self.verb)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl PublishOptions {
    /// New default options
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout (default: network publish timeout)
    #[inline]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Verb (default: `EVENT`)
    #[inline]
    pub fn verb(mut self, verb: PublishVerb) -> Self {
        self.verb = verb;
        self
    }

    /// Called with a snapshot before any relay answers and after every
    /// relay state change, until the publish resolves
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&PublishProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }
}

type EventCallback = Arc<dyn Fn(SeenEvent) + Send + Sync>;
type EoseCallback = Arc<dyn Fn(&RelayUrl) + Send + Sync>;

/// Subscribe options
#[derive(Clone)]
pub struct SubscribeOptions {
    pub(super) on_event: EventCallback,
    pub(super) on_eose: Option<EoseCallback>,
}

impl fmt::Debug for SubscribeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("on_eose", &self.on_eose.is_some())
            .finish()
    }
}

impl SubscribeOptions {
    /// New options
    ///
    /// `on_event` is called once per distinct verified event.
    pub fn new<F>(on_event: F) -> Self
    where
        F: Fn(SeenEvent) + Send + Sync + 'static,
    {
        Self {
            on_event: Arc::new(on_event),
            on_eose: None,
        }
    }

    /// Called on every EOSE
    pub fn on_eose<F>(mut self, f: F) -> Self
    where
        F: Fn(&RelayUrl) + Send + Sync + 'static,
    {
        self.on_eose = Some(Arc::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (MULTIPLEXER_URL_VAR, "wss://proxy.example/"),
            (COUNT_RELAYS_VAR, "wss://a.example, wss://b.example,,not-a-url"),
            (FORCE_RELAYS_VAR, ""),
        ]);
        let opts = NetworkOptions::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(
            opts.multiplexer_url,
            Some(RelayUrl::parse("wss://proxy.example").unwrap())
        );
        assert_eq!(opts.count_relays.len(), 2);
        assert!(opts.force_relays.is_empty());
        assert_eq!(opts.publish_timeout, DEFAULT_PUBLISH_TIMEOUT);
    }

    #[test]
    fn test_empty_multiplexer_disables() {
        let opts = NetworkOptions::from_lookup(|key| match key {
            MULTIPLEXER_URL_VAR => Some(String::from("  ")),
            _ => None,
        });
        assert!(opts.multiplexer_url.is_none());
        assert!(opts.count_relays.is_empty());
    }
}
