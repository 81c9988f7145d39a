// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Pool options

use std::time::Duration;

use super::constants::{
    DEFAULT_ERROR_TTL, DEFAULT_HOUSEKEEPING_INTERVAL, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_NOTIFICATION_CHANNEL_SIZE, DEFAULT_SLOW_QUALITY_THRESHOLD,
};
use crate::connection::ConnectionOptions;

/// [`Pool`](super::Pool) options
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub(super) housekeeping: bool,
    pub(super) housekeeping_interval: Duration,
    pub(super) idle_timeout: Duration,
    pub(super) error_ttl: Duration,
    pub(super) slow_quality_threshold: f64,
    pub(super) notification_channel_size: usize,
    pub(super) connection: ConnectionOptions,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            housekeeping: true,
            housekeeping_interval: DEFAULT_HOUSEKEEPING_INTERVAL,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            error_ttl: DEFAULT_ERROR_TTL,
            slow_quality_threshold: DEFAULT_SLOW_QUALITY_THRESHOLD,
            notification_channel_size: DEFAULT_NOTIFICATION_CHANNEL_SIZE,
            connection: ConnectionOptions::default(),
        }
    }
}

impl PoolOptions {
    /// New default options
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run housekeeping in background (default: true)
    #[inline]
    pub fn housekeeping(mut self, enable: bool) -> Self {
        self.housekeeping = enable;
        self
    }

    /// Housekeeping interval (default: 10 secs)
    #[inline]
    pub fn housekeeping_interval(mut self, interval: Duration) -> Self {
        self.housekeeping_interval = interval;
        self
    }

    /// Close connections without traffic for longer than this (default: 60 secs)
    #[inline]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Clear connection errors older than this (default: 10 secs)
    #[inline]
    pub fn error_ttl(mut self, ttl: Duration) -> Self {
        self.error_ttl = ttl;
        self
    }

    /// Report connections with a quality score below this (default: 0.3)
    #[inline]
    pub fn slow_quality_threshold(mut self, threshold: f64) -> Self {
        self.slow_quality_threshold = threshold;
        self
    }

    /// Notification channel size (default: 4096)
    #[inline]
    pub fn notification_channel_size(mut self, size: usize) -> Self {
        self.notification_channel_size = size;
        self
    }

    /// Options for every connection created by the pool
    #[inline]
    pub fn connection(mut self, opts: ConnectionOptions) -> Self {
        self.connection = opts;
        self
    }
}
