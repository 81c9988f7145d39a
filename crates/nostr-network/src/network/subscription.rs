// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Subscription

use std::sync::{Arc, Mutex, MutexGuard};

use nostr::{Event, SubscriptionId};
use tokio::sync::Notify;

use crate::url::RelayUrl;

/// Verified event with its provenance
///
/// Clones share the provenance list, which keeps growing as other relays
/// deliver the same event.
#[derive(Debug, Clone)]
pub struct SeenEvent {
    /// Event
    pub event: Event,
    seen_on: Arc<Mutex<Vec<RelayUrl>>>,
}

impl SeenEvent {
    pub(super) fn new(event: Event, relay_url: RelayUrl) -> Self {
        Self {
            event,
            seen_on: Arc::new(Mutex::new(vec![relay_url])),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RelayUrl>> {
        // Nothing can panic while holding the lock
        self.seen_on.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Relays that delivered the event, in arrival order
    pub fn seen_on(&self) -> Vec<RelayUrl> {
        self.lock().clone()
    }

    /// Record another relay. Returns `false` if already known.
    pub(super) fn add_relay(&self, relay_url: RelayUrl) -> bool {
        let mut seen_on = self.lock();
        if seen_on.contains(&relay_url) {
            return false;
        }
        seen_on.push(relay_url);
        true
    }
}

/// Subscription handle
///
/// The subscription runs until [`Subscription::stop`] is called; dropping
/// the handle doesn't stop it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    stop: Arc<Notify>,
}

impl Subscription {
    pub(super) fn new(id: SubscriptionId, stop: Arc<Notify>) -> Self {
        Self { id, stop }
    }

    /// Subscription ID
    #[inline]
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Stop the subscription
    ///
    /// Sends `CLOSE` to the relays. Pooled connections stay open.
    #[inline]
    pub fn stop(&self) {
        self.stop.notify_one();
    }
}
