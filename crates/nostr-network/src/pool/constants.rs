// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Pool constants

use core::time::Duration;

pub(super) const DEFAULT_HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(10);
pub(super) const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub(super) const DEFAULT_ERROR_TTL: Duration = Duration::from_secs(10);
pub(super) const DEFAULT_SLOW_QUALITY_THRESHOLD: f64 = 0.3;
/// Pool default notification channel size
pub const DEFAULT_NOTIFICATION_CHANNEL_SIZE: usize = 4096;
