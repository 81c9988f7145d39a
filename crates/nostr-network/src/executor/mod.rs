// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Executor
//!
//! Binds a [`Target`] to one operation: opens the underlying connections,
//! waits for readiness where relays require it, and turns relay messages
//! into per-relay operation events.

use std::collections::HashSet;
use std::fmt;

use async_utility::futures_util::future;
use async_utility::task;
use nostr::{Event, EventId, Filter, SubscriptionId};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};

mod metadata;

pub use self::metadata::{NoRelayMetadata, RelayLimitation, RelayMetadata, StaticRelayMetadata};
use crate::connection::{Connection, ConnectionNotification, ConnectionStatus};
use crate::message::{ClientMessage, RelayMessage};
use crate::pool::Pool;
use crate::target::Target;
use crate::url::RelayUrl;

const CONNECTION_LOST: &str = "connection lost";

/// Verb used to publish an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PublishVerb {
    /// `EVENT`
    #[default]
    Event,
    /// `AUTH`, bypasses the readiness gate
    Auth,
}

impl fmt::Display for PublishVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => write!(f, "EVENT"),
            Self::Auth => write!(f, "AUTH"),
        }
    }
}

/// Per-relay publish outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    /// Relay accepted the event
    Ok {
        /// Relay URL
        relay_url: RelayUrl,
    },
    /// Relay rejected the event, or it couldn't be delivered
    Error {
        /// Relay URL
        relay_url: RelayUrl,
        /// Reason
        message: String,
    },
}

/// Per-relay subscription event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeEvent {
    /// Event received, not yet verified
    Event {
        /// Relay URL
        relay_url: RelayUrl,
        /// Event
        event: Box<Event>,
    },
    /// End of stored events
    Eose {
        /// Relay URL
        relay_url: RelayUrl,
    },
    /// Relay closed the subscription
    Closed {
        /// Relay URL
        relay_url: RelayUrl,
        /// Reason
        message: String,
    },
}

/// Count answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountEvent {
    /// Relay URL
    pub relay_url: RelayUrl,
    /// Count
    pub count: usize,
}

/// Running operation
///
/// Dropping it stops the operation like [`Operation::stop`].
#[derive(Debug)]
pub struct Operation<E> {
    rx: mpsc::UnboundedReceiver<E>,
    stop: watch::Sender<bool>,
}

impl<E> Operation<E> {
    fn new() -> (Self, mpsc::UnboundedSender<E>, watch::Receiver<bool>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop, stop_rx) = watch::channel(false);
        (Self { rx, stop }, tx, stop_rx)
    }

    /// Next event
    ///
    /// Returns `None` once every relay is done.
    #[inline]
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Stop listening
    ///
    /// Pooled connections stay open.
    #[inline]
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

/// Executor
#[derive(Debug, Clone)]
pub struct Executor {
    target: Target,
}

impl Executor {
    /// Pick the target for `relays`, connect it and wait for readiness
    ///
    /// The multiplexer is used only if set and either more than one relay is
    /// requested or a connection to it already exists, unless that
    /// connection is in error. Relays with an `auth_required` or
    /// `payment_required` limitation are awaited on their readiness gate,
    /// unless `bypass_gate` is set.
    ///
    /// Connection failures are logged and recorded on the connection; they
    /// never abort the build.
    pub async fn build(
        pool: &Pool,
        relays: &[RelayUrl],
        multiplexer: Option<&RelayUrl>,
        metadata: &dyn RelayMetadata,
        bypass_gate: bool,
    ) -> Self {
        let target: Target = select_target(pool, relays, multiplexer).await;

        let routes = target.routes();
        future::join_all(routes.iter().map(|(connection, relays)| {
            let gated: bool =
                !bypass_gate && relays.iter().any(|r| metadata.limitation(r).is_gated());
            prepare(connection, gated)
        }))
        .await;

        Self { target }
    }

    /// Target
    #[inline]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Send `event` to every relay
    pub fn publish(&self, event: &Event, verb: PublishVerb) -> Operation<PublishEvent> {
        let id: EventId = event.id;
        let msg: ClientMessage = match verb {
            PublishVerb::Event => ClientMessage::event(event.clone()),
            PublishVerb::Auth => ClientMessage::auth(event.clone()),
        };

        let (operation, tx, stop) = Operation::new();

        for (connection, relays) in self.target.routes().into_iter() {
            let notifications = connection.notifications();

            if let Err(e) = connection.send_routed(&relays, &msg) {
                tracing::warn!(url = %connection.url(), id = %id, error = %e, "Can't send {verb}.");
                for relay_url in relays.into_iter() {
                    let _ = tx.send(PublishEvent::Error {
                        relay_url,
                        message: e.to_string(),
                    });
                }
                continue;
            }

            let tx = tx.clone();
            let stop = stop.clone();
            task::spawn(async move {
                forward(
                    &relays,
                    notifications,
                    stop,
                    &tx,
                    |relay_url, message| match message {
                        RelayMessage::Ok {
                            event_id,
                            status,
                            message,
                        } if event_id == id => {
                            let relay_url: RelayUrl = relay_url.clone();
                            if status {
                                Step::Finish(PublishEvent::Ok { relay_url })
                            } else {
                                Step::Finish(PublishEvent::Error { relay_url, message })
                            }
                        }
                        _ => Step::Ignore,
                    },
                    |relay_url| {
                        Some(PublishEvent::Error {
                            relay_url: relay_url.clone(),
                            message: String::from(CONNECTION_LOST),
                        })
                    },
                )
                .await;
            });
        }

        operation
    }

    /// Open a subscription on every relay
    ///
    /// Stopping or dropping the operation sends `CLOSE`.
    pub fn subscribe(
        &self,
        subscription_id: SubscriptionId,
        filters: Vec<Filter>,
    ) -> Operation<SubscribeEvent> {
        let msg: ClientMessage = ClientMessage::req(subscription_id.clone(), filters);

        let (operation, tx, stop) = Operation::new();

        for (connection, relays) in self.target.routes().into_iter() {
            let notifications = connection.notifications();

            if let Err(e) = connection.send_routed(&relays, &msg) {
                tracing::warn!(url = %connection.url(), id = %subscription_id, error = %e, "Can't send REQ.");
                continue;
            }

            let tx = tx.clone();
            let stop = stop.clone();
            let subscription_id = subscription_id.clone();
            task::spawn(async move {
                let exit: Exit = forward(
                    &relays,
                    notifications,
                    stop,
                    &tx,
                    |relay_url, message| match message {
                        RelayMessage::Event {
                            subscription_id: id,
                            event,
                        } if id == subscription_id => Step::Emit(SubscribeEvent::Event {
                            relay_url: relay_url.clone(),
                            event,
                        }),
                        RelayMessage::EndOfStoredEvents(id) if id == subscription_id => {
                            Step::Emit(SubscribeEvent::Eose {
                                relay_url: relay_url.clone(),
                            })
                        }
                        RelayMessage::Closed {
                            subscription_id: id,
                            message,
                        } if id == subscription_id => Step::Finish(SubscribeEvent::Closed {
                            relay_url: relay_url.clone(),
                            message,
                        }),
                        _ => Step::Ignore,
                    },
                    |_| None,
                )
                .await;

                if let Exit::Stopped(open) = exit {
                    if !open.is_empty() {
                        let close = ClientMessage::close(subscription_id.clone());
                        if let Err(e) = connection.send_routed(&open, &close) {
                            tracing::debug!(url = %connection.url(), id = %subscription_id, error = %e, "Can't send CLOSE.");
                        }
                    }
                }
            });
        }

        operation
    }

    /// Ask every relay for a count
    pub fn count(&self, filters: Vec<Filter>) -> Operation<CountEvent> {
        let subscription_id: SubscriptionId = SubscriptionId::generate();
        let msg: ClientMessage = ClientMessage::count(subscription_id.clone(), filters);

        let (operation, tx, stop) = Operation::new();

        for (connection, relays) in self.target.routes().into_iter() {
            let notifications = connection.notifications();

            if let Err(e) = connection.send_routed(&relays, &msg) {
                tracing::warn!(url = %connection.url(), error = %e, "Can't send COUNT.");
                continue;
            }

            let tx = tx.clone();
            let stop = stop.clone();
            let subscription_id = subscription_id.clone();
            task::spawn(async move {
                forward(
                    &relays,
                    notifications,
                    stop,
                    &tx,
                    |relay_url, message| match message {
                        RelayMessage::Count {
                            subscription_id: id,
                            count,
                        } if id == subscription_id => Step::Finish(CountEvent {
                            relay_url: relay_url.clone(),
                            count,
                        }),
                        _ => Step::Ignore,
                    },
                    |_| None,
                )
                .await;
            });
        }

        operation
    }
}

async fn select_target(pool: &Pool, relays: &[RelayUrl], multiplexer: Option<&RelayUrl>) -> Target {
    if let Some(proxy) = multiplexer {
        if relays.len() > 1 || pool.has(proxy).await {
            let proxy: Connection = pool.get(proxy).await;

            if !proxy.has_error() {
                return Target::Multiplexed {
                    proxy,
                    relays: relays.to_vec(),
                };
            }

            tracing::warn!(url = %proxy.url(), "Multiplexer in error, connecting to relays directly.");
        }
    }

    let connections: Vec<Connection> = future::join_all(relays.iter().map(|url| pool.get(url))).await;
    Target::Direct { connections }
}

async fn prepare(connection: &Connection, gated: bool) {
    let status: ConnectionStatus = connection.status();
    if status.needs_connect() || status.is_connecting() {
        // Joins an attempt already in progress. Failure is recorded on the connection
        if connection.connect().await.is_err() {
            return;
        }
    }

    if gated {
        tracing::debug!(url = %connection.url(), "Waiting for relay to be ready.");
        connection.gate().wait().await;
    }
}

enum Step<E> {
    Ignore,
    Emit(E),
    /// Emit, then stop listening to this relay
    Finish(E),
}

enum Exit {
    /// Every relay finished
    Completed,
    /// Stopped by caller, with the relays still listened to
    Stopped(Vec<RelayUrl>),
    /// Connection closed or broke
    Lost,
}

/// Forward the messages of `relays` to the operation channel
async fn forward<E, H, L>(
    relays: &[RelayUrl],
    mut notifications: broadcast::Receiver<ConnectionNotification>,
    mut stop: watch::Receiver<bool>,
    tx: &mpsc::UnboundedSender<E>,
    mut handle: H,
    on_lost: L,
) -> Exit
where
    H: FnMut(&RelayUrl, RelayMessage) -> Step<E>,
    L: Fn(&RelayUrl) -> Option<E>,
{
    let mut pending: HashSet<RelayUrl> = relays.iter().cloned().collect();

    while !pending.is_empty() {
        tokio::select! {
            _ = stop.changed() => return Exit::Stopped(pending.into_iter().collect()),
            _ = tx.closed() => return Exit::Stopped(pending.into_iter().collect()),
            res = notifications.recv() => match res {
                Ok(ConnectionNotification::Message { relay_url, message }) => {
                    if !pending.contains(&relay_url) {
                        continue;
                    }

                    match handle(&relay_url, message) {
                        Step::Ignore => {}
                        Step::Emit(event) => {
                            let _ = tx.send(event);
                        }
                        Step::Finish(event) => {
                            let _ = tx.send(event);
                            pending.remove(&relay_url);
                        }
                    }
                }
                Ok(ConnectionNotification::Status { status: ConnectionStatus::Closed | ConnectionStatus::Error }) => {
                    for relay_url in pending.iter() {
                        if let Some(event) = on_lost(relay_url) {
                            let _ = tx.send(event);
                        }
                    }
                    return Exit::Lost;
                }
                Ok(..) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = %skipped, "Operation lagged behind connection notifications.");
                }
                Err(RecvError::Closed) => return Exit::Lost,
            }
        }
    }

    Exit::Completed
}
