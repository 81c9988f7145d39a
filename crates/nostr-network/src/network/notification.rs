// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Network notifications

use std::time::Duration;

use nostr::{EventId, SubscriptionId};

use super::auth::AuthFlag;
use crate::url::RelayUrl;

/// Network notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkNotification {
    /// Publish started
    Publish {
        /// Event ID
        event_id: EventId,
        /// Target relays
        relays: Vec<RelayUrl>,
    },
    /// Subscription opened
    SubscriptionOpened {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Target relays
        relays: Vec<RelayUrl>,
    },
    /// Subscription stopped
    SubscriptionClosed {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Target relays
        relays: Vec<RelayUrl>,
    },
    /// New verified event delivered
    Event {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// First relay that delivered it
        relay_url: RelayUrl,
    },
    /// First EOSE of a relay for a subscription
    Eose {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Relay URL
        relay_url: RelayUrl,
        /// Time since the subscription started
        latency: Duration,
    },
    /// Relay auth flag set or cleared
    RelayAuth {
        /// Relay URL
        relay_url: RelayUrl,
        /// New flag, `None` when cleared
        flag: Option<AuthFlag>,
    },
    /// Connections below the quality threshold
    SlowConnections {
        /// Connection URLs
        relays: Vec<RelayUrl>,
    },
}
