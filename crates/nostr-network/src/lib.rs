// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Nostr relay network
//!
//! Client-side engine that keeps a pool of relay connections and turns
//! publish, subscribe and count intents into multi-relay operations with
//! well-defined completion and partial-failure semantics.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub use nostr;

pub mod connection;
pub mod error;
pub mod executor;
pub mod message;
pub mod network;
pub mod pool;
pub mod prelude;
pub mod relay_set;
mod shared;
pub mod target;
pub mod transport;
pub mod url;

#[cfg(test)]
mod mock;

pub use self::connection::{
    Connection, ConnectionNotification, ConnectionOptions, ConnectionStats, ConnectionStatus,
    GateOpenReason, ReadinessGate,
};
pub use self::error::Error;
pub use self::executor::{
    CountEvent, Executor, NoRelayMetadata, Operation, PublishEvent, PublishVerb,
    RelayLimitation, RelayMetadata, StaticRelayMetadata, SubscribeEvent,
};
pub use self::network::{
    AuthFlag, AuthHandler, KeysAuthHandler, Network, NetworkBuilder, NetworkNotification,
    NetworkOptions, PublishOptions, PublishProgress, SeenEvent, SubscribeOptions, Subscription,
};
pub use self::pool::{HousekeepingReport, Pool, PoolOptions};
pub use self::relay_set::{RelaySet, RelaySetIssue};
pub use self::target::Target;
pub use self::url::RelayUrl;
