// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_utility::{task, time};
use async_wsocket::futures_util::{SinkExt, StreamExt};
use async_wsocket::Message;
use nostr::{Event, EventId};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Mutex, MutexGuard, Notify};

use super::constants::{OUTBOUND_CHANNEL_SIZE, WEBSOCKET_TX_TIMEOUT};
use super::error::Error;
use super::gate::{GateOpenReason, ReadinessGate};
use super::options::ConnectionOptions;
use super::stats::ConnectionStats;
use super::status::{AtomicConnectionStatus, ConnectionStatus};
use super::ConnectionNotification;
use crate::message::{decode_frame, ClientMessage, IncomingMessage, RelayMessage};
use crate::network::AuthFlag;
use crate::shared::SharedState;
use crate::transport::{BoxSink, BoxStream};
use crate::url::RelayUrl;

enum IngesterCommand {
    Authenticate {
        relay_url: RelayUrl,
        challenge: String,
    },
}

#[derive(Debug)]
struct ConnectionChannels {
    outbound: (mpsc::Sender<String>, Mutex<mpsc::Receiver<String>>),
    terminate: Notify,
}

impl ConnectionChannels {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(OUTBOUND_CHANNEL_SIZE);
        Self {
            outbound: (tx, Mutex::new(rx)),
            terminate: Notify::new(),
        }
    }

    fn send(&self, json: String) -> Result<(), Error> {
        self.outbound
            .0
            .try_send(json)
            .map_err(|_| Error::CantSendChannelMessage {
                channel: String::from("outbound"),
            })
    }

    async fn clear_outbound(&self) {
        let mut rx = self.outbound.1.lock().await;
        while rx.try_recv().is_ok() {}
    }

    #[inline]
    async fn rx_outbound(&self) -> MutexGuard<'_, mpsc::Receiver<String>> {
        self.outbound.1.lock().await
    }
}

#[derive(Debug)]
pub(super) struct InnerConnection {
    pub(super) url: RelayUrl,
    pub(super) opts: ConnectionOptions,
    status: AtomicConnectionStatus,
    pub(super) stats: ConnectionStats,
    pub(super) gate: ReadinessGate,
    state: SharedState,
    channels: ConnectionChannels,
    running: AtomicBool,
    /// Incremented on every connection attempt, so that a stale socket task
    /// can't overwrite the status of a newer one.
    generation: AtomicU64,
    pub(super) connect_lock: Mutex<()>,
    pub(super) notification_sender: broadcast::Sender<ConnectionNotification>,
}

impl InnerConnection {
    pub(super) fn new(url: RelayUrl, state: SharedState, opts: ConnectionOptions) -> Self {
        let (notification_sender, ..) =
            broadcast::channel::<ConnectionNotification>(opts.notification_channel_size);

        let stats = ConnectionStats::default();
        stats.touch();

        Self {
            url,
            opts,
            status: AtomicConnectionStatus::default(),
            stats,
            gate: ReadinessGate::default(),
            state,
            channels: ConnectionChannels::new(),
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            connect_lock: Mutex::new(()),
            notification_sender,
        }
    }

    #[inline]
    pub(super) fn status(&self) -> ConnectionStatus {
        self.status.load()
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.set(status);

        match status {
            ConnectionStatus::New => {}
            ConnectionStatus::Connecting => {
                tracing::debug!(url = %self.url, "Connecting to relay.")
            }
            ConnectionStatus::Open => tracing::info!(url = %self.url, "Connected to relay."),
            ConnectionStatus::Closed => tracing::info!(url = %self.url, "Disconnected from relay."),
            ConnectionStatus::Error => {
                tracing::info!(url = %self.url, "Connection to relay broke.")
            }
        }

        self.notify(ConnectionNotification::Status { status });
    }

    #[inline]
    fn notify(&self, notification: ConnectionNotification) {
        // No receivers is fine
        let _ = self.notification_sender.send(notification);
    }

    pub(super) async fn try_connect(self: &Arc<Self>) -> Result<(), Error> {
        let generation: u64 = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.set_status(ConnectionStatus::Connecting);
        self.stats.new_attempt();

        // New socket, new gate
        self.gate.reset();
        self.gate.arm(self.opts.boot_grace);

        let res = time::timeout(
            Some(self.opts.connect_timeout),
            self.state.transport.open(
                &self.url,
                &self.opts.connection_mode,
                self.opts.connect_timeout,
            ),
        )
        .await;

        let error: Error = match res {
            Some(Ok(socket)) => {
                // Frames queued for a previous socket
                self.channels.clear_outbound().await;

                self.stats.new_success();
                self.stats.touch();
                self.running.store(true, Ordering::SeqCst);
                self.set_status(ConnectionStatus::Open);

                let inner: Arc<Self> = Arc::clone(self);
                task::spawn(async move { inner.run(generation, socket.sink, socket.stream).await });

                return Ok(());
            }
            Some(Err(e)) => Error::Transport(e),
            None => Error::Timeout,
        };

        tracing::error!(url = %self.url, error = %error, "Connection failed.");
        self.stats.new_error();
        self.set_status(ConnectionStatus::Error);

        Err(error)
    }

    async fn run(&self, generation: u64, mut ws_tx: BoxSink, ws_rx: BoxStream) {
        let mut rx_outbound = self.channels.rx_outbound().await;

        let (ingester_tx, ingester_rx) = mpsc::unbounded_channel();

        let outcome: Result<(), Error> = tokio::select! {
            res = self.sender_message_handler(&mut ws_tx, &mut rx_outbound) => res,
            res = self.receiver_message_handler(ws_rx, ingester_tx) => res,
            res = self.ingester(ingester_rx) => res,
            _ = self.channels.terminate.notified() => Ok(()),
        };

        match close_ws(&mut ws_tx).await {
            Ok(..) => tracing::debug!(url = %self.url, "WebSocket connection closed."),
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "Can't close WebSocket connection.")
            }
        }

        // A newer socket owns the state now
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }

        self.running.store(false, Ordering::SeqCst);

        if self.status().is_closed() {
            return;
        }

        match outcome {
            Ok(()) => self.set_status(ConnectionStatus::Closed),
            Err(e) => {
                tracing::error!(url = %self.url, error = %e, "Connection task exited with error.");
                self.stats.new_error();
                self.set_status(ConnectionStatus::Error);
            }
        }
    }

    async fn sender_message_handler(
        &self,
        ws_tx: &mut BoxSink,
        rx_outbound: &mut MutexGuard<'_, mpsc::Receiver<String>>,
    ) -> Result<(), Error> {
        while let Some(json) = rx_outbound.recv().await {
            let size: usize = json.len();

            tracing::debug!("Sending '{json}' to '{}' (size: {size} bytes)", self.url);

            send_ws_msg(ws_tx, Message::Text(json)).await?;

            self.stats.add_bytes_sent(size);
            self.stats.touch();
        }

        Ok(())
    }

    async fn receiver_message_handler(
        &self,
        mut ws_rx: BoxStream,
        ingester_tx: mpsc::UnboundedSender<IngesterCommand>,
    ) -> Result<(), Error> {
        while let Some(msg) = ws_rx.next().await {
            match msg? {
                Message::Text(json) => {
                    self.stats.add_bytes_received(json.len());
                    self.stats.touch();
                    self.handle_frame(&json, &ingester_tx);
                }
                Message::Binary(_) => {
                    tracing::warn!(url = %self.url, "Binary messages aren't supported.");
                }
                #[cfg(not(target_arch = "wasm32"))]
                Message::Close(None) => break,
                #[cfg(not(target_arch = "wasm32"))]
                Message::Close(Some(frame)) => {
                    tracing::info!(url = %self.url, code = %frame.code, reason = %frame.reason, "Connection closed by peer.");
                    break;
                }
                #[cfg(not(target_arch = "wasm32"))]
                _ => {}
            }
        }

        Ok(())
    }

    fn handle_frame(&self, frame: &str, ingester_tx: &mpsc::UnboundedSender<IngesterCommand>) {
        tracing::trace!(url = %self.url, frame = %frame, "Received frame.");

        let messages: Vec<IncomingMessage> = match decode_frame(&self.url, frame) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(url = %self.url, error = %e, frame = %frame, "Can't handle relay message.");
                return;
            }
        };

        for IncomingMessage {
            relay_url,
            message,
        } in messages.into_iter()
        {
            match &message {
                RelayMessage::Auth { challenge } => {
                    tracing::debug!(url = %relay_url, challenge = %challenge, "Received AUTH challenge.");

                    let command = IngesterCommand::Authenticate {
                        relay_url: relay_url.clone(),
                        challenge: challenge.clone(),
                    };
                    let _ = ingester_tx.send(command);
                }
                RelayMessage::Ok {
                    event_id,
                    status,
                    message,
                } => {
                    tracing::debug!(url = %relay_url, id = %event_id, status = %status, msg = %message, "Received OK.");
                }
                RelayMessage::EndOfStoredEvents(id) => {
                    tracing::debug!(url = %relay_url, id = %id, "Received EOSE.");
                }
                RelayMessage::Closed {
                    subscription_id,
                    message,
                } => {
                    tracing::debug!(url = %relay_url, id = %subscription_id, msg = %message, "Subscription closed by relay.");
                }
                RelayMessage::Notice(notice) => {
                    tracing::warn!(url = %relay_url, msg = %notice, "Received NOTICE.");
                }
                RelayMessage::Event { .. } | RelayMessage::Count { .. } => {}
            }

            self.notify(ConnectionNotification::Message {
                relay_url,
                message,
            });
        }
    }

    async fn ingester(&self, mut rx: mpsc::UnboundedReceiver<IngesterCommand>) -> Result<(), Error> {
        while let Some(command) = rx.recv().await {
            match command {
                IngesterCommand::Authenticate {
                    relay_url,
                    challenge,
                } => match self.authenticate(&relay_url, challenge).await {
                    Ok(()) => {
                        self.state.set_auth_flag(&relay_url, None).await;
                        self.gate.open(GateOpenReason::Authenticated);

                        tracing::info!(url = %relay_url, "Authenticated to relay.");

                        self.notify(ConnectionNotification::Authenticated { relay_url });
                    }
                    Err(e) => {
                        if let Error::AuthRejected(..) = e {
                            self.state
                                .set_auth_flag(&relay_url, Some(AuthFlag::Forbidden))
                                .await;
                        }

                        tracing::error!(url = %relay_url, error = %e, "Can't authenticate to relay.");

                        self.notify(ConnectionNotification::AuthenticationFailed { relay_url });
                    }
                },
            }
        }

        Ok(())
    }

    async fn authenticate(&self, relay_url: &RelayUrl, challenge: String) -> Result<(), Error> {
        self.state
            .set_auth_flag(relay_url, Some(AuthFlag::Unauthorized))
            .await;

        let handler = self
            .state
            .auth_handler()
            .await
            .ok_or(Error::AuthHandlerNotConfigured)?;

        let event: Event = handler
            .authenticate(relay_url, &challenge)
            .await
            .ok_or(Error::AuthDeclined)?;
        let id: EventId = event.id;

        // Subscribe before sending, to not miss the OK
        let mut notifications = self.notification_sender.subscribe();

        self.send_routed(std::slice::from_ref(relay_url), &ClientMessage::auth(event))?;

        let (status, message) = self
            .wait_for_ok(&mut notifications, relay_url, &id, self.opts.auth_timeout)
            .await?;

        if status {
            Ok(())
        } else {
            Err(Error::AuthRejected(message))
        }
    }

    async fn wait_for_ok(
        &self,
        notifications: &mut broadcast::Receiver<ConnectionNotification>,
        relay_url: &RelayUrl,
        id: &EventId,
        timeout: Duration,
    ) -> Result<(bool, String), Error> {
        time::timeout(Some(timeout), async {
            loop {
                match notifications.recv().await {
                    Ok(ConnectionNotification::Message {
                        relay_url: from,
                        message:
                            RelayMessage::Ok {
                                event_id,
                                status,
                                message,
                            },
                    }) => {
                        if &from == relay_url && &event_id == id {
                            return Ok((status, message));
                        }
                    }
                    Ok(ConnectionNotification::Status { status }) => {
                        if !status.is_open() {
                            return Err(Error::NotConnected);
                        }
                    }
                    Ok(..) => {}
                    Err(RecvError::Lagged(..)) => {}
                    Err(RecvError::Closed) => return Err(Error::Terminated),
                }
            }
        })
        .await
        .ok_or(Error::Timeout)?
    }

    pub(super) fn send_routed(
        &self,
        relays: &[RelayUrl],
        msg: &ClientMessage,
    ) -> Result<(), Error> {
        let json: String = match relays {
            [] => msg.as_json(),
            [relay] if relay == &self.url => msg.as_json(),
            relays => msg.as_routed_json(relays),
        };

        if !self.status().is_open() {
            return Err(Error::NotConnected);
        }

        self.channels.send(json)
    }

    pub(super) fn disconnect(&self) {
        if self.status().is_closed() {
            return;
        }

        // A permit stored while no task runs would kill the next socket
        if self.running.load(Ordering::SeqCst) {
            self.channels.terminate.notify_one();
        }

        self.set_status(ConnectionStatus::Closed);
    }
}

async fn send_ws_msg(tx: &mut BoxSink, msg: Message) -> Result<(), Error> {
    match time::timeout(Some(WEBSOCKET_TX_TIMEOUT), tx.send(msg)).await {
        Some(res) => Ok(res?),
        None => Err(Error::Timeout),
    }
}

async fn close_ws(tx: &mut BoxSink) -> Result<(), Error> {
    match time::timeout(Some(WEBSOCKET_TX_TIMEOUT), tx.close()).await {
        Some(res) => Ok(res?),
        None => Err(Error::Timeout),
    }
}
