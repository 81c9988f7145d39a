// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Network
//!
//! Entry point of the crate. Turns publish, subscribe and count intents into
//! executor operations and aggregates their per-relay events.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_utility::{task, time};
use nostr::{Event, EventId, Filter, SubscriptionId};
use tokio::sync::{broadcast, Notify, RwLock};

mod auth;
mod notification;
mod options;
mod progress;
mod subscription;

pub use self::auth::{AuthFlag, AuthHandler, KeysAuthHandler};
pub use self::notification::NetworkNotification;
pub use self::options::{NetworkOptions, PublishOptions, SubscribeOptions};
pub use self::progress::PublishProgress;
use self::progress::PublishTracker;
pub use self::subscription::{SeenEvent, Subscription};
use crate::executor::{
    CountEvent, Executor, NoRelayMetadata, PublishEvent, PublishVerb, RelayMetadata,
    SubscribeEvent,
};
use crate::pool::Pool;
use crate::relay_set::RelaySet;
use crate::url::RelayUrl;

/// [`Network`] builder
#[derive(Debug)]
pub struct NetworkBuilder {
    pool: Pool,
    opts: NetworkOptions,
    metadata: Arc<dyn RelayMetadata>,
}

impl NetworkBuilder {
    /// New builder around `pool`
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            opts: NetworkOptions::default(),
            metadata: Arc::new(NoRelayMetadata),
        }
    }

    /// Set options
    #[inline]
    pub fn opts(mut self, opts: NetworkOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Set the relay metadata source
    #[inline]
    pub fn relay_metadata<T>(mut self, metadata: T) -> Self
    where
        T: RelayMetadata + 'static,
    {
        self.metadata = Arc::new(metadata);
        self
    }

    /// Build
    pub fn build(self) -> Network {
        Network {
            inner: Arc::new(InnerNetwork {
                multiplexer_url: RwLock::new(self.opts.multiplexer_url.clone()),
                pool: self.pool,
                opts: self.opts,
                metadata: self.metadata,
            }),
        }
    }
}

#[derive(Debug)]
struct InnerNetwork {
    pool: Pool,
    opts: NetworkOptions,
    multiplexer_url: RwLock<Option<RelayUrl>>,
    metadata: Arc<dyn RelayMetadata>,
}

/// Network
#[derive(Debug, Clone)]
pub struct Network {
    inner: Arc<InnerNetwork>,
}

impl Network {
    /// New network with default options
    #[inline]
    pub fn new(pool: Pool) -> Self {
        Self::builder(pool).build()
    }

    /// New builder
    #[inline]
    pub fn builder(pool: Pool) -> NetworkBuilder {
        NetworkBuilder::new(pool)
    }

    /// Connection pool
    #[inline]
    pub fn pool(&self) -> &Pool {
        &self.inner.pool
    }

    /// Get new notification listener
    #[inline]
    pub fn notifications(&self) -> broadcast::Receiver<NetworkNotification> {
        self.inner.pool.notifications()
    }

    /// Set the handler answering relay AUTH challenges
    #[inline]
    pub async fn set_auth_handler<T>(&self, handler: T)
    where
        T: AuthHandler + 'static,
    {
        self.inner.pool.set_auth_handler(handler).await
    }

    /// Current auth flag of a relay
    #[inline]
    pub async fn auth_flag(&self, relay_url: &RelayUrl) -> Option<AuthFlag> {
        self.inner.pool.state().auth_flag(relay_url).await
    }

    /// Current multiplexer URL
    pub async fn multiplexer_url(&self) -> Option<RelayUrl> {
        let url = self.inner.multiplexer_url.read().await;
        url.clone()
    }

    /// Change the multiplexer URL, `None` disables multiplexing
    ///
    /// Running operations keep their target.
    pub async fn set_multiplexer_url(&self, url: Option<RelayUrl>) {
        let mut current = self.inner.multiplexer_url.write().await;
        *current = url;
    }

    /// Normalize a caller relay list
    ///
    /// Replaced by the force relays when configured.
    pub fn relay_set<I, S>(&self, relays: I) -> RelaySet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.inner.opts.force_relays.is_empty() {
            return RelaySet::from_urls(self.inner.opts.force_relays.iter().cloned());
        }

        RelaySet::new(relays)
    }

    async fn executor(&self, relays: &[RelayUrl], bypass_gate: bool) -> Executor {
        let multiplexer: Option<RelayUrl> = self.multiplexer_url().await;
        Executor::build(
            &self.inner.pool,
            relays,
            multiplexer.as_ref(),
            self.inner.metadata.as_ref(),
            bypass_gate,
        )
        .await
    }

    /// Publish an event
    ///
    /// Resolves once every relay succeeded, failed or timed out. Never fails:
    /// per-relay problems only show in the returned progress.
    pub async fn publish<I, S>(&self, relays: I, event: &Event, opts: PublishOptions) -> PublishProgress
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let relays: Vec<RelayUrl> = self.relay_set(relays).into_urls();
        let event_id: EventId = event.id;

        let executor: Executor = self
            .executor(&relays, opts.verb == PublishVerb::Auth)
            .await;

        self.inner.pool.state().notify(NetworkNotification::Publish {
            event_id,
            relays: relays.clone(),
        });

        tracing::debug!(id = %event_id, relays = %relays.len(), verb = %opts.verb, "Publishing event.");

        let timeout: Duration = opts.timeout.unwrap_or(self.inner.opts.publish_timeout);
        let deadline = time::sleep(timeout);
        tokio::pin!(deadline);

        let mut tracker = PublishTracker::new(relays);
        let mut operation = executor.publish(event, opts.verb);

        // Report progress to start
        let mut changed: bool = true;

        loop {
            if changed {
                if let Some(progress) = tracker.try_resolve() {
                    tracing::debug!(
                        id = %event_id,
                        succeeded = %progress.succeeded.len(),
                        failed = %progress.failed.len(),
                        timed_out = %progress.timed_out.len(),
                        "Finished publishing event."
                    );
                    operation.stop();
                    return progress;
                }

                if let Some(on_progress) = &opts.on_progress {
                    on_progress(&tracker.progress());
                }
            }

            changed = tokio::select! {
                event = operation.recv() => match event {
                    Some(PublishEvent::Ok { relay_url }) => tracker.succeed(&relay_url),
                    Some(PublishEvent::Error { relay_url, message }) => {
                        tracing::debug!(url = %relay_url, id = %event_id, msg = %message, "Publish failed.");
                        tracker.fail(&relay_url)
                    }
                    // Nothing else will come
                    None => {
                        (&mut deadline).await;
                        tracker.time_out()
                    }
                },
                _ = &mut deadline => tracker.time_out(),
            };
        }
    }

    /// Subscribe
    ///
    /// Events are deduplicated across relays and verified before delivery.
    /// Runs until [`Subscription::stop`] is called.
    pub async fn subscribe<I, S>(
        &self,
        relays: I,
        filters: Vec<Filter>,
        opts: SubscribeOptions,
    ) -> Subscription
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let relays: Vec<RelayUrl> = self.relay_set(relays).into_urls();
        let subscription_id: SubscriptionId = SubscriptionId::generate();

        let executor: Executor = self.executor(&relays, false).await;
        let started: Instant = Instant::now();

        tracing::debug!(id = %subscription_id, relays = %relays.len(), "Starting subscription.");

        let state = self.inner.pool.state().clone();
        state.notify(NetworkNotification::SubscriptionOpened {
            subscription_id: subscription_id.clone(),
            relays: relays.clone(),
        });

        let mut operation = executor.subscribe(subscription_id.clone(), filters);

        let stop: Arc<Notify> = Arc::new(Notify::new());
        let subscription: Subscription = Subscription::new(subscription_id.clone(), stop.clone());

        let pool: Pool = self.inner.pool.clone();
        task::spawn(async move {
            let mut seen: HashMap<EventId, SeenEvent> = HashMap::new();
            let mut eose: HashSet<RelayUrl> = HashSet::new();

            loop {
                tokio::select! {
                    event = operation.recv() => match event {
                        Some(SubscribeEvent::Event { relay_url, event }) => {
                            if let Some(seen_event) = seen.get(&event.id) {
                                seen_event.add_relay(relay_url);
                                continue;
                            }

                            if let Err(e) = event.verify() {
                                tracing::debug!(url = %relay_url, id = %event.id, error = %e, "Discarding event with invalid signature.");
                                continue;
                            }

                            let seen_event = SeenEvent::new(*event, relay_url.clone());
                            seen.insert(seen_event.event.id, seen_event.clone());

                            state.notify(NetworkNotification::Event {
                                subscription_id: subscription_id.clone(),
                                relay_url,
                            });

                            (opts.on_event)(seen_event);
                        }
                        Some(SubscribeEvent::Eose { relay_url }) => {
                            if let Some(on_eose) = &opts.on_eose {
                                on_eose(&relay_url);
                            }

                            if eose.insert(relay_url.clone()) {
                                let latency: Duration = started.elapsed();

                                if let Some(connection) = pool.find(&relay_url).await {
                                    connection.stats().save_latency(latency).await;
                                }

                                state.notify(NetworkNotification::Eose {
                                    subscription_id: subscription_id.clone(),
                                    relay_url,
                                    latency,
                                });
                            }
                        }
                        Some(SubscribeEvent::Closed { relay_url, message }) => {
                            tracing::debug!(url = %relay_url, id = %subscription_id, msg = %message, "Relay closed subscription.");
                        }
                        // Every relay closed or was lost
                        None => {
                            stop.notified().await;
                            break;
                        }
                    },
                    _ = stop.notified() => break,
                }
            }

            tracing::debug!(id = %subscription_id, "Closing subscription.");

            operation.stop();

            state.notify(NetworkNotification::SubscriptionClosed {
                subscription_id,
                relays,
            });
        });

        subscription
    }

    /// Count events on the count relays
    #[inline]
    pub async fn count(&self, filters: Vec<Filter>) -> usize {
        let relays: Vec<RelayUrl> = self.inner.opts.count_relays.clone();
        self.count_with(relays.iter().map(|u| u.as_str()), filters, self.inner.opts.count_timeout)
            .await
    }

    /// Count events on `relays`
    ///
    /// Resolves with the first answer, or `0` if none arrives within `timeout`.
    pub async fn count_with<I, S>(&self, relays: I, filters: Vec<Filter>, timeout: Duration) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let relays: Vec<RelayUrl> = self.relay_set(relays).into_urls();
        let executor: Executor = self.executor(&relays, false).await;
        let mut operation = executor.count(filters);

        let res = time::timeout(Some(timeout), operation.recv()).await;
        operation.stop();

        match res {
            Some(Some(CountEvent { relay_url, count })) => {
                tracing::debug!(url = %relay_url, count = %count, "Received count.");
                count
            }
            Some(None) | None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use nostr::{EventBuilder, Keys};
    use serde_json::json;

    use super::*;
    use crate::connection::ConnectionOptions;
    use crate::mock::{MockRelay, MockTransport};
    use crate::pool::PoolOptions;

    const A: &str = "wss://a.example";
    const B: &str = "wss://b.example";

    fn url(url: &str) -> RelayUrl {
        RelayUrl::parse(url).unwrap()
    }

    fn pool(transport: &MockTransport) -> Pool {
        let connection = ConnectionOptions::new()
            .connect_timeout(Duration::from_millis(500))
            .boot_grace(Duration::from_millis(100));
        Pool::with_transport(
            transport.clone(),
            PoolOptions::new().housekeeping(false).connection(connection),
        )
    }

    fn network(transport: &MockTransport, opts: NetworkOptions) -> Network {
        Network::builder(pool(transport)).opts(opts).build()
    }

    fn event(content: &str) -> Event {
        EventBuilder::text_note(content)
            .sign_with_keys(&Keys::generate())
            .unwrap()
    }

    async fn wait_until<F>(f: F)
    where
        F: Fn() -> bool,
    {
        time::timeout(Some(Duration::from_secs(2)), async {
            while !f() {
                time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_publish_partial_timeout() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::accept_all());
        transport.delay(A, Duration::from_millis(50));
        transport.relay(B, MockRelay::Silent);
        let network = network(&transport, NetworkOptions::new());

        let snapshots: Arc<Mutex<Vec<PublishProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let opts = {
            let snapshots = snapshots.clone();
            PublishOptions::new()
                .timeout(Duration::from_millis(300))
                .on_progress(move |p| snapshots.lock().unwrap().push(p.clone()))
        };

        let start = Instant::now();
        let progress = network.publish([A, B], &event("hello"), opts).await;

        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(progress.succeeded, [url(A)].into());
        assert_eq!(progress.timed_out, [url(B)].into());
        assert!(progress.failed.is_empty());
        assert!(progress.pending.is_empty());
        assert_eq!(progress.completed.len(), 2);

        // Start, then A succeeded. The final state is returned, not reported.
        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].pending.len(), 2);
        assert_eq!(snapshots[1].succeeded, [url(A)].into());
        assert_eq!(snapshots[1].pending, [url(B)].into());
    }

    #[tokio::test]
    async fn test_publish_resolves_before_timeout() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::accept_all());
        transport.relay(B, MockRelay::reject_all("blocked: no"));
        let network = network(&transport, NetworkOptions::new());

        let start = Instant::now();
        let progress = network
            .publish([A, B], &event("hello"), PublishOptions::new())
            .await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(progress.succeeded, [url(A)].into());
        assert_eq!(progress.failed, [url(B)].into());
        assert!(progress.timed_out.is_empty());
    }

    #[tokio::test]
    async fn test_publish_unreachable_relay_fails() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::Unreachable);
        let network = network(&transport, NetworkOptions::new());

        let progress = network
            .publish([A], &event("hello"), PublishOptions::new())
            .await;

        assert_eq!(progress.failed, [url(A)].into());
    }

    #[tokio::test]
    async fn test_publish_to_no_relays() {
        let network = network(&MockTransport::new(), NetworkOptions::new());
        let progress = network
            .publish(Vec::<String>::new(), &event("hello"), PublishOptions::new())
            .await;
        assert_eq!(progress, PublishProgress::default());
    }

    #[tokio::test]
    async fn test_publish_duplicate_relays() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::accept_all());
        let network = network(&transport, NetworkOptions::new());

        let progress = network
            .publish(
                ["wss://a.example", "wss://a.example/"],
                &event("hello"),
                PublishOptions::new(),
            )
            .await;

        assert_eq!(progress.completed, [url(A)].into());
        assert_eq!(transport.sent(A).len(), 1);
    }

    #[tokio::test]
    async fn test_publish_through_multiplexer() {
        let transport = MockTransport::new();
        transport.relay("wss://proxy.example", MockRelay::accept_all());
        let opts = NetworkOptions::new().multiplexer_url(Some(url("wss://proxy.example")));
        let network = network(&transport, opts);

        let progress = network
            .publish([A, B], &event("hello"), PublishOptions::new())
            .await;

        assert_eq!(progress.succeeded, [url(A), url(B)].into());
        assert_eq!(transport.connects(A), 0);
        assert_eq!(transport.connects(B), 0);
    }

    #[tokio::test]
    async fn test_multiplexer_lost_mid_publish() {
        let transport = MockTransport::new();
        transport.relay("wss://proxy.example", MockRelay::Silent);
        let opts = NetworkOptions::new().multiplexer_url(Some(url("wss://proxy.example")));
        let network = network(&transport, opts);

        let publish = {
            let network = network.clone();
            tokio::spawn(async move {
                network
                    .publish([A, B], &event("hello"), PublishOptions::new())
                    .await
            })
        };

        time::sleep(Duration::from_millis(50)).await;
        transport.fail("wss://proxy.example");

        let progress = publish.await.unwrap();
        assert_eq!(progress.failed, [url(A), url(B)].into());
    }

    #[tokio::test]
    async fn test_multiplexer_can_be_disabled() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::accept_all());
        transport.relay(B, MockRelay::accept_all());
        let opts = NetworkOptions::new().multiplexer_url(Some(url("wss://proxy.example")));
        let network = network(&transport, opts);

        network.set_multiplexer_url(None).await;
        assert!(network.multiplexer_url().await.is_none());

        let progress = network
            .publish([A, B], &event("hello"), PublishOptions::new())
            .await;
        assert_eq!(progress.succeeded.len(), 2);
        assert_eq!(transport.connects("wss://proxy.example"), 0);
    }

    #[tokio::test]
    async fn test_force_relays() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::accept_all());
        let opts = NetworkOptions::new().force_relays([url(A)]);
        let network = network(&transport, opts);

        let progress = network
            .publish([B], &event("hello"), PublishOptions::new())
            .await;

        assert_eq!(progress.succeeded, [url(A)].into());
        assert_eq!(transport.connects(B), 0);
    }

    #[tokio::test]
    async fn test_subscribe_dedup() {
        let e1 = event("e1");
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::store(vec![e1.clone()]));
        transport.relay(B, MockRelay::store(vec![e1.clone()]));
        let network = network(&transport, NetworkOptions::new());

        let delivered: Arc<Mutex<Vec<SeenEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let eoses: Arc<Mutex<Vec<RelayUrl>>> = Arc::new(Mutex::new(Vec::new()));
        let opts = {
            let delivered = delivered.clone();
            let eoses = eoses.clone();
            SubscribeOptions::new(move |e| delivered.lock().unwrap().push(e))
                .on_eose(move |r| eoses.lock().unwrap().push(r.clone()))
        };

        let sub = network.subscribe([A, B], vec![Filter::new()], opts).await;
        wait_until(|| eoses.lock().unwrap().len() == 2).await;

        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].event.id, e1.id);

        let seen_on: HashSet<RelayUrl> = delivered[0].seen_on().into_iter().collect();
        assert_eq!(seen_on, [url(A), url(B)].into());

        sub.stop();
    }

    #[tokio::test]
    async fn test_subscribe_drops_invalid_signature() {
        let valid = event("valid");
        let mut forged = serde_json::to_value(event("original")).unwrap();
        forged["content"] = json!("tampered");
        let forged: Event = serde_json::from_value(forged).unwrap();

        let transport = MockTransport::new();
        transport.relay(A, MockRelay::store(vec![forged.clone(), valid.clone()]));
        let network = network(&transport, NetworkOptions::new());

        let delivered: Arc<Mutex<Vec<EventId>>> = Arc::new(Mutex::new(Vec::new()));
        let eose: Arc<Mutex<bool>> = Arc::new(Mutex::new(false));
        let opts = {
            let delivered = delivered.clone();
            let eose = eose.clone();
            SubscribeOptions::new(move |e| delivered.lock().unwrap().push(e.event.id))
                .on_eose(move |_| *eose.lock().unwrap() = true)
        };

        let sub = network.subscribe([A], vec![Filter::new()], opts).await;
        wait_until(|| *eose.lock().unwrap()).await;

        assert_eq!(*delivered.lock().unwrap(), vec![valid.id]);
        sub.stop();
    }

    #[tokio::test]
    async fn test_invalid_copy_does_not_shadow_valid_event() {
        let genuine = event("genuine");
        let mut forged = serde_json::to_value(&genuine).unwrap();
        forged["content"] = json!("tampered");
        let forged: Event = serde_json::from_value(forged).unwrap();
        assert_eq!(forged.id, genuine.id);

        let transport = MockTransport::new();
        transport.relay(A, MockRelay::store(vec![forged]));
        transport.relay(B, MockRelay::store(vec![genuine.clone()]));
        // Forged copy arrives first
        transport.delay(B, Duration::from_millis(100));
        let network = network(&transport, NetworkOptions::new());

        let delivered: Arc<Mutex<Vec<SeenEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let eoses: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let opts = {
            let delivered = delivered.clone();
            let eoses = eoses.clone();
            SubscribeOptions::new(move |e| delivered.lock().unwrap().push(e))
                .on_eose(move |_| *eoses.lock().unwrap() += 1)
        };

        let sub = network.subscribe([A, B], vec![Filter::new()], opts).await;
        wait_until(|| *eoses.lock().unwrap() == 2).await;
        sub.stop();

        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].event.content, "genuine");
        assert_eq!(delivered[0].seen_on(), vec![url(B)]);
    }

    #[tokio::test]
    async fn test_first_eose_records_latency_once() {
        let transport = MockTransport::new();
        transport.relay(
            A,
            MockRelay::responder(|_, msg| match msg[0].as_str() {
                Some("REQ") => vec![json!(["EOSE", msg[1]]), json!(["EOSE", msg[1]])],
                _ => Vec::new(),
            }),
        );
        let network = network(&transport, NetworkOptions::new());
        let mut notifications = network.notifications();

        let eoses: Arc<Mutex<usize>> = Arc::new(Mutex::new(0));
        let opts = {
            let eoses = eoses.clone();
            SubscribeOptions::new(|_| {}).on_eose(move |_| *eoses.lock().unwrap() += 1)
        };

        let sub = network.subscribe([A], vec![Filter::new()], opts).await;
        wait_until(|| *eoses.lock().unwrap() == 2).await;
        sub.stop();

        let mut latency_notifications: usize = 0;
        loop {
            match notifications.recv().await.unwrap() {
                NetworkNotification::Eose { relay_url, .. } => {
                    assert_eq!(relay_url, url(A));
                    latency_notifications += 1;
                }
                NetworkNotification::SubscriptionClosed { .. } => break,
                _ => {}
            }
        }
        assert_eq!(latency_notifications, 1);

        let connection = network.pool().find(&url(A)).await.unwrap();
        assert!(connection.stats().latency().await.is_some());
    }

    #[tokio::test]
    async fn test_subscription_stop_sends_close() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::accept_all());
        let network = network(&transport, NetworkOptions::new());

        let sub = network
            .subscribe([A], vec![Filter::new()], SubscribeOptions::new(|_| {}))
            .await;
        sub.stop();

        let expected: String = format!(r#"["CLOSE","{}"]"#, sub.id());
        wait_until(|| transport.sent(A).contains(&expected)).await;

        let connection = network.pool().find(&url(A)).await.unwrap();
        assert!(connection.status().is_open());
    }

    #[tokio::test]
    async fn test_count_first_answer() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::count(42));
        transport.relay(B, MockRelay::Silent);
        let opts = NetworkOptions::new().count_relays([url(A), url(B)]);
        let network = network(&transport, opts);

        assert_eq!(network.count(vec![Filter::new()]).await, 42);
    }

    #[tokio::test]
    async fn test_count_defaults_to_zero() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::Silent);
        let network = network(&transport, NetworkOptions::new());

        let start = Instant::now();
        let count = network
            .count_with([A], vec![Filter::new()], Duration::from_millis(200))
            .await;

        assert_eq!(count, 0);
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_auth_flags_are_exposed() {
        let transport = MockTransport::new();
        transport.relay(A, MockRelay::accept_all());
        let network = network(&transport, NetworkOptions::new());
        network
            .set_auth_handler(KeysAuthHandler::new(Keys::generate()))
            .await;
        let mut notifications = network.notifications();

        network
            .publish([A], &event("hello"), PublishOptions::new())
            .await;
        transport.push(A, json!(["AUTH", "challenge"]));

        let mut flags: Vec<Option<AuthFlag>> = Vec::new();
        while flags.len() < 2 {
            if let NetworkNotification::RelayAuth { flag, .. } = notifications.recv().await.unwrap()
            {
                flags.push(flag);
            }
        }

        assert_eq!(flags, vec![Some(AuthFlag::Unauthorized), None]);
        assert_eq!(network.auth_flag(&url(A)).await, None);
    }
}
