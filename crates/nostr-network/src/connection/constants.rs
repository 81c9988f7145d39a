// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Connection constants

use core::time::Duration;

pub(super) const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
/// Grace period after which the readiness gate opens even without AUTH
pub const DEFAULT_BOOT_GRACE: Duration = Duration::from_secs(2);
pub(super) const WAIT_FOR_AUTH_OK_TIMEOUT: Duration = Duration::from_secs(7);
pub(super) const DEFAULT_NOTIFICATION_CHANNEL_SIZE: usize = 2048;
pub(super) const OUTBOUND_CHANNEL_SIZE: usize = 1024;

pub(super) const LATENCY_MAX_VALUES: usize = 20;
pub(super) const QUALITY_LATENCY_FLOOR: Duration = Duration::from_millis(500);
pub(super) const QUALITY_LATENCY_CEILING: Duration = Duration::from_secs(5);
pub(super) const WEBSOCKET_TX_TIMEOUT: Duration = Duration::from_secs(10);
