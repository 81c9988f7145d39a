// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Readiness gate
//!
//! One-shot signal with two inputs: a grace timer armed when the socket is
//! opened, and the completion of the AUTH handshake. Whichever comes first
//! opens the gate; later inputs are ignored until the gate is reset by a
//! new socket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_utility::{task, time};
use tokio::sync::watch;

/// Why a [`ReadinessGate`] opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOpenReason {
    /// The grace period elapsed
    GracePeriodElapsed,
    /// The relay accepted our AUTH event
    Authenticated,
}

/// Readiness gate
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    state: Arc<watch::Sender<Option<GateOpenReason>>>,
    epoch: Arc<AtomicU64>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        let (state, ..) = watch::channel(None);
        Self {
            state: Arc::new(state),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl ReadinessGate {
    /// Check if the gate is open
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Reason the gate opened, if open
    #[inline]
    pub fn open_reason(&self) -> Option<GateOpenReason> {
        *self.state.borrow()
    }

    /// Open the gate
    ///
    /// Returns `false` if it was already open.
    pub fn open(&self, reason: GateOpenReason) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_none() {
                *state = Some(reason);
                true
            } else {
                false
            }
        })
    }

    /// Close the gate and invalidate pending grace timers
    pub(crate) fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_if_modified(|state| state.take().is_some());
    }

    /// Open the gate after `grace`, unless reset before
    pub fn arm(&self, grace: Duration) {
        let epoch: u64 = self.epoch.load(Ordering::SeqCst);
        let gate: Self = self.clone();
        task::spawn(async move {
            time::sleep(grace).await;

            if gate.epoch.load(Ordering::SeqCst) == epoch {
                gate.open(GateOpenReason::GracePeriodElapsed);
            }
        });
    }

    /// Wait until the gate is open
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| state.is_some()).await;
    }
}
