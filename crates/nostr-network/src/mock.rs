// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! In-memory relays for tests

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_wsocket::futures_util::{stream, Sink};
use async_wsocket::{ConnectionMode, Message};
use nostr::util::BoxedFuture;
use nostr::Event;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::transport::{Socket, TransportError, WebSocketTransport};
use crate::url::RelayUrl;

type Frame = Result<Message, TransportError>;
type Responder = Arc<dyn Fn(&str, &Value) -> Vec<Value> + Send + Sync>;

/// Scripted relay behavior
#[derive(Clone)]
pub(crate) enum MockRelay {
    /// Connection refused
    Unreachable,
    /// Accepts the socket, never answers
    Silent,
    /// Answers every client message with the returned relay messages.
    /// Receives the target relay URL and the unwrapped client message.
    Responder(Responder),
}

impl MockRelay {
    pub(crate) fn responder<F>(f: F) -> Self
    where
        F: Fn(&str, &Value) -> Vec<Value> + Send + Sync + 'static,
    {
        Self::Responder(Arc::new(f))
    }

    /// `OK true` for every `EVENT` and `AUTH`, `EOSE` for every `REQ`
    pub(crate) fn accept_all() -> Self {
        Self::responder(|_, msg| match msg[0].as_str() {
            Some("EVENT") | Some("AUTH") => vec![json!(["OK", msg[1]["id"], true, ""])],
            Some("REQ") => vec![json!(["EOSE", msg[1]])],
            _ => Vec::new(),
        })
    }

    /// `OK false` for every `EVENT` and `AUTH`
    pub(crate) fn reject_all(reason: &'static str) -> Self {
        Self::responder(move |_, msg| match msg[0].as_str() {
            Some("EVENT") | Some("AUTH") => vec![json!(["OK", msg[1]["id"], false, reason])],
            _ => Vec::new(),
        })
    }

    /// Serves `events` followed by `EOSE` for every `REQ`
    pub(crate) fn store(events: Vec<Event>) -> Self {
        Self::responder(move |_, msg| match msg[0].as_str() {
            Some("REQ") => {
                let mut out: Vec<Value> = events
                    .iter()
                    .map(|e| json!(["EVENT", msg[1], e]))
                    .collect();
                out.push(json!(["EOSE", msg[1]]));
                out
            }
            _ => Vec::new(),
        })
    }

    /// Answers every `COUNT` with `count`
    pub(crate) fn count(count: usize) -> Self {
        Self::responder(move |_, msg| match msg[0].as_str() {
            Some("COUNT") => vec![json!(["COUNT", msg[1], {"count": count}])],
            _ => Vec::new(),
        })
    }
}

impl fmt::Debug for MockRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "Unreachable"),
            Self::Silent => write!(f, "Silent"),
            Self::Responder(..) => write!(f, "Responder"),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    relays: HashMap<String, MockRelay>,
    sockets: HashMap<String, Vec<mpsc::UnboundedSender<Frame>>>,
    sent: HashMap<String, Vec<String>>,
    connects: HashMap<String, usize>,
    delays: HashMap<String, Duration>,
}

/// Transport backed by scripted in-memory relays
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn relay(&self, url: &str, relay: MockRelay) {
        let mut state = self.state.lock().unwrap();
        state.relays.insert(key(url), relay);
    }

    /// Delay every answer of `url`
    pub(crate) fn delay(&self, url: &str, delay: Duration) {
        let mut state = self.state.lock().unwrap();
        state.delays.insert(key(url), delay);
    }

    /// Push a frame to every open socket of `url`
    pub(crate) fn push(&self, url: &str, frame: Value) {
        self.send_frame(url, Ok(Message::Text(frame.to_string())));
    }

    /// Close every socket of `url` cleanly
    pub(crate) fn close(&self, url: &str) {
        self.send_frame(url, Ok(Message::Close(None)));
    }

    /// Break every socket of `url`
    pub(crate) fn fail(&self, url: &str) {
        self.send_frame(url, Err(TransportError::Unreachable(url.to_string())));
    }

    fn send_frame(&self, url: &str, frame: Frame) {
        let state = self.state.lock().unwrap();
        if let Some(sockets) = state.sockets.get(&key(url)) {
            for socket in sockets.iter() {
                let frame: Frame = match &frame {
                    Ok(msg) => Ok(msg.clone()),
                    Err(e) => Err(TransportError::Unreachable(e.to_string())),
                };
                let _ = socket.send(frame);
            }
        }
    }

    /// Frames sent to `url`
    pub(crate) fn sent(&self, url: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.sent.get(&key(url)).cloned().unwrap_or_default()
    }

    /// Number of sockets opened to `url`
    pub(crate) fn connects(&self, url: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.connects.get(&key(url)).copied().unwrap_or_default()
    }
}

impl WebSocketTransport for MockTransport {
    fn open<'a>(
        &'a self,
        url: &'a RelayUrl,
        _mode: &'a ConnectionMode,
        _timeout: Duration,
    ) -> BoxedFuture<'a, Result<Socket, TransportError>> {
        Box::pin(async move {
            let url_key: String = url.to_string();
            let (tx, rx) = mpsc::unbounded_channel::<Frame>();

            let (relay, delay) = {
                let mut state = self.state.lock().unwrap();
                *state.connects.entry(url_key.clone()).or_default() += 1;

                let relay: MockRelay = state
                    .relays
                    .get(&url_key)
                    .cloned()
                    .unwrap_or(MockRelay::Silent);

                if let MockRelay::Unreachable = relay {
                    return Err(TransportError::Unreachable(url_key));
                }

                state
                    .sockets
                    .entry(url_key.clone())
                    .or_default()
                    .push(tx.clone());

                (relay, state.delays.get(&url_key).copied())
            };

            let sink = MockSink {
                url: url_key,
                relay,
                delay,
                inbound: tx,
                state: self.state.clone(),
            };
            let stream = stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|frame| (frame, rx))
            });

            Ok(Socket::new(sink, Box::pin(stream)))
        })
    }
}

struct MockSink {
    url: String,
    relay: MockRelay,
    delay: Option<Duration>,
    inbound: mpsc::UnboundedSender<Frame>,
    state: Arc<Mutex<MockState>>,
}

impl MockSink {
    fn answer(&self, frame: &str) {
        let responder = match &self.relay {
            MockRelay::Responder(responder) => responder.clone(),
            _ => return,
        };

        let value: Value = match serde_json::from_str(frame) {
            Ok(value) => value,
            Err(..) => return,
        };

        // Unwrap routing envelope
        let (relays, msg): (Option<Vec<String>>, Value) = match value.get(0) {
            Some(Value::Object(header)) => {
                let relays: Vec<String> = header
                    .get("relays")
                    .and_then(Value::as_array)
                    .map(|r| r.iter().filter_map(|u| u.as_str().map(String::from)).collect())
                    .unwrap_or_default();
                (Some(relays), value[1].clone())
            }
            _ => (None, value),
        };

        let mut answers: Vec<String> = Vec::new();
        match relays {
            Some(relays) => {
                for relay in relays.iter() {
                    for answer in responder(relay, &msg) {
                        answers.push(json!([{"relays": [relay]}, answer]).to_string());
                    }
                }
            }
            None => {
                for answer in responder(&self.url, &msg) {
                    answers.push(answer.to_string());
                }
            }
        }

        let inbound = self.inbound.clone();
        match self.delay {
            Some(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    for answer in answers {
                        let _ = inbound.send(Ok(Message::Text(answer)));
                    }
                });
            }
            None => {
                for answer in answers {
                    let _ = inbound.send(Ok(Message::Text(answer)));
                }
            }
        }
    }
}

impl Sink<Message> for MockSink {
    type Error = TransportError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        if let Message::Text(frame) = item {
            {
                let mut state = self.state.lock().unwrap();
                state
                    .sent
                    .entry(self.url.clone())
                    .or_default()
                    .push(frame.clone());
            }
            self.answer(&frame);
        }
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

fn key(url: &str) -> String {
    RelayUrl::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}
