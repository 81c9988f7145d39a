// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::time::Duration;

use nostr::{EventBuilder, Filter, Keys, Kind};
use nostr_network::{
    KeysAuthHandler, Network, NetworkOptions, Pool, PoolOptions, PublishOptions, SubscribeOptions,
};
use tracing_subscriber::fmt::format::FmtSpan;

const RELAYS: [&str; 2] = ["wss://relay.damus.io", "wss://nos.lol"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter("info,nostr_network=debug")
        .init();

    let keys = Keys::generate();

    let pool = Pool::new(PoolOptions::default());
    let network = Network::builder(pool)
        .opts(NetworkOptions::from_env())
        .build();
    network
        .set_auth_handler(KeysAuthHandler::new(keys.clone()))
        .await;

    let event = EventBuilder::text_note("Hello from nostr-network").sign_with_keys(&keys)?;
    let progress = network
        .publish(
            RELAYS,
            &event,
            PublishOptions::new().on_progress(|p| {
                tracing::info!(done = %p.completed.len(), pending = %p.pending.len(), "Publish progress");
            }),
        )
        .await;
    tracing::info!(?progress, "Published");

    let filter = Filter::new().kind(Kind::TextNote).limit(10);
    let subscription = network
        .subscribe(
            RELAYS,
            vec![filter],
            SubscribeOptions::new(|seen| {
                tracing::info!(id = %seen.event.id, relays = ?seen.seen_on(), "Received event");
            }),
        )
        .await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    subscription.stop();

    Ok(())
}
