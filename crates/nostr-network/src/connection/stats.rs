// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Connection Stats

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nostr::Timestamp;
use tokio::sync::RwLock;

use super::constants::{LATENCY_MAX_VALUES, QUALITY_LATENCY_CEILING, QUALITY_LATENCY_FLOOR};

#[derive(Debug, Default)]
struct InnerConnectionStats {
    attempts: AtomicUsize,
    success: AtomicUsize,
    bytes_sent: AtomicUsize,
    bytes_received: AtomicUsize,
    /// UNIX timestamp, `0` means never
    last_activity: AtomicU64,
    /// UNIX timestamp, `0` means no error
    last_error: AtomicU64,
    latencies: RwLock<VecDeque<Duration>>,
}

/// Connection stats
///
/// Shared, eventually-consistent counters: every operation using the
/// connection may update them, none owns them.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStats {
    inner: Arc<InnerConnectionStats>,
}

impl ConnectionStats {
    /// The number of times a connection has been attempted
    #[inline]
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// The number of times a connection has been successfully established
    #[inline]
    pub fn success(&self) -> usize {
        self.inner.success.load(Ordering::SeqCst)
    }

    /// Success rate
    pub fn success_rate(&self) -> f64 {
        let attempts: usize = self.attempts();
        if attempts > 0 {
            self.success() as f64 / attempts as f64
        } else {
            0.0
        }
    }

    /// Bytes sent
    #[inline]
    pub fn bytes_sent(&self) -> usize {
        self.inner.bytes_sent.load(Ordering::SeqCst)
    }

    /// Bytes received
    #[inline]
    pub fn bytes_received(&self) -> usize {
        self.inner.bytes_received.load(Ordering::SeqCst)
    }

    /// Last inbound or outbound traffic
    pub fn last_activity(&self) -> Option<Timestamp> {
        load_timestamp(&self.inner.last_activity)
    }

    /// Most recent error
    pub fn last_error(&self) -> Option<Timestamp> {
        load_timestamp(&self.inner.last_error)
    }

    /// Average latency
    pub async fn latency(&self) -> Option<Duration> {
        let latencies = self.inner.latencies.read().await;

        if latencies.is_empty() {
            return None;
        }

        let sum: Duration = latencies.iter().sum();
        sum.checked_div(latencies.len() as u32)
    }

    /// Quality score between `0.0` and `1.0`
    ///
    /// Product of the connection success rate and a latency factor that
    /// decreases linearly from `1.0` to `0.0` between 500 ms and 5 s of
    /// average latency. A connection never attempted scores `1.0`.
    pub async fn quality(&self) -> f64 {
        if self.attempts() == 0 {
            return 1.0;
        }

        let factor: f64 = match self.latency().await {
            Some(latency) => latency_factor(latency),
            None => 1.0,
        };

        self.success_rate() * factor
    }

    #[inline]
    pub(super) fn new_attempt(&self) {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub(super) fn new_success(&self) {
        self.inner.success.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub(super) fn new_error(&self) {
        self.set_last_error(Timestamp::now());
    }

    #[inline]
    pub(super) fn clear_error(&self) {
        self.inner.last_error.store(0, Ordering::SeqCst);
    }

    #[inline]
    pub(super) fn touch(&self) {
        self.set_last_activity(Timestamp::now());
    }

    #[inline]
    pub(super) fn add_bytes_sent(&self, size: usize) {
        if size > 0 {
            self.inner.bytes_sent.fetch_add(size, Ordering::SeqCst);
        }
    }

    #[inline]
    pub(super) fn add_bytes_received(&self, size: usize) {
        if size > 0 {
            self.inner.bytes_received.fetch_add(size, Ordering::SeqCst);
        }
    }

    pub(crate) async fn save_latency(&self, latency: Duration) {
        let mut latencies = self.inner.latencies.write().await;
        if latencies.len() >= LATENCY_MAX_VALUES {
            latencies.pop_back();
        }
        latencies.push_front(latency)
    }

    pub(crate) fn set_last_activity(&self, timestamp: Timestamp) {
        self.inner
            .last_activity
            .store(timestamp.as_u64(), Ordering::SeqCst);
    }

    pub(crate) fn set_last_error(&self, timestamp: Timestamp) {
        // `0` is reserved for "no error"
        let value: u64 = timestamp.as_u64().max(1);
        self.inner.last_error.store(value, Ordering::SeqCst);
    }
}

fn load_timestamp(value: &AtomicU64) -> Option<Timestamp> {
    match value.load(Ordering::SeqCst) {
        0 => None,
        secs => Some(Timestamp::from(secs)),
    }
}

fn latency_factor(latency: Duration) -> f64 {
    if latency <= QUALITY_LATENCY_FLOOR {
        return 1.0;
    }

    if latency >= QUALITY_LATENCY_CEILING {
        return 0.0;
    }

    let span: f64 = (QUALITY_LATENCY_CEILING - QUALITY_LATENCY_FLOOR).as_secs_f64();
    let over: f64 = (latency - QUALITY_LATENCY_FLOOR).as_secs_f64();
    1.0 - over / span
}
