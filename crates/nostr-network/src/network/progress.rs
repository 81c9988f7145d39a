// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Publish progress

use std::collections::BTreeSet;

use crate::url::RelayUrl;

/// Publish progress snapshot
///
/// `succeeded`, `failed` and `timed_out` are disjoint. `completed` is their
/// union and `pending` the requested relays not completed yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishProgress {
    /// Relays that accepted the event
    pub succeeded: BTreeSet<RelayUrl>,
    /// Relays that rejected the event or couldn't be reached
    pub failed: BTreeSet<RelayUrl>,
    /// Relays that didn't answer in time
    pub timed_out: BTreeSet<RelayUrl>,
    /// Relays with an outcome
    pub completed: BTreeSet<RelayUrl>,
    /// Relays without an outcome
    pub pending: BTreeSet<RelayUrl>,
}

impl PublishProgress {
    /// Check if every relay has an outcome
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Publish state machine
#[derive(Debug)]
pub(super) struct PublishTracker {
    relays: BTreeSet<RelayUrl>,
    succeeded: BTreeSet<RelayUrl>,
    failed: BTreeSet<RelayUrl>,
    timed_out: BTreeSet<RelayUrl>,
    resolved: bool,
}

impl PublishTracker {
    pub(super) fn new<I>(relays: I) -> Self
    where
        I: IntoIterator<Item = RelayUrl>,
    {
        Self {
            relays: relays.into_iter().collect(),
            succeeded: BTreeSet::new(),
            failed: BTreeSet::new(),
            timed_out: BTreeSet::new(),
            resolved: false,
        }
    }

    /// Record a success. A success always wins over a previous failure or timeout.
    ///
    /// Returns `true` if the state changed.
    pub(super) fn succeed(&mut self, relay_url: &RelayUrl) -> bool {
        if !self.relays.contains(relay_url) || !self.succeeded.insert(relay_url.clone()) {
            return false;
        }

        self.failed.remove(relay_url);
        self.timed_out.remove(relay_url);
        true
    }

    /// Record a failure. Ignored if the relay already succeeded.
    ///
    /// Returns `true` if the state changed.
    pub(super) fn fail(&mut self, relay_url: &RelayUrl) -> bool {
        if !self.relays.contains(relay_url)
            || self.succeeded.contains(relay_url)
            || !self.failed.insert(relay_url.clone())
        {
            return false;
        }

        self.timed_out.remove(relay_url);
        true
    }

    /// Move every pending relay to `timed_out`
    pub(super) fn time_out(&mut self) -> bool {
        let pending: Vec<RelayUrl> = self.pending().cloned().collect();
        let changed: bool = !pending.is_empty();
        self.timed_out.extend(pending);
        changed
    }

    fn pending(&self) -> impl Iterator<Item = &RelayUrl> {
        self.relays.iter().filter(|url| {
            !self.succeeded.contains(*url)
                && !self.failed.contains(*url)
                && !self.timed_out.contains(*url)
        })
    }

    pub(super) fn progress(&self) -> PublishProgress {
        let completed: BTreeSet<RelayUrl> = self
            .succeeded
            .iter()
            .chain(self.failed.iter())
            .chain(self.timed_out.iter())
            .cloned()
            .collect();

        PublishProgress {
            succeeded: self.succeeded.clone(),
            failed: self.failed.clone(),
            timed_out: self.timed_out.clone(),
            completed,
            pending: self.pending().cloned().collect(),
        }
    }

    /// Final snapshot, returned once when nothing is pending
    pub(super) fn try_resolve(&mut self) -> Option<PublishProgress> {
        if self.resolved || self.pending().next().is_some() {
            return None;
        }

        self.resolved = true;
        Some(self.progress())
    }
}
