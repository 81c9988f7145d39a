// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Messages
//!
//! Client and relay messages as exchanged on a socket, plus the routing
//! envelope used on a multiplexer connection:
//!
//! ```json
//! [{"relays": ["wss://a.example"]}, ["EOSE", "sub"]]
//! ```

use nostr::{Event, EventId, Filter, SubscriptionId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::url::RelayUrl;

/// Message handle error
#[derive(Debug, thiserror::Error)]
pub enum MessageHandleError {
    /// Json error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Message has an invalid format
    #[error("message has an invalid format")]
    InvalidMessageFormat,
    /// Unknown message type
    #[error("unknown message type: {0}")]
    UnknownMessage(String),
}

/// Messages sent by clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Publish an event
    Event(Box<Event>),
    /// Open a subscription
    Req {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Filters
        filters: Vec<Filter>,
    },
    /// Request a count of matching events
    Count {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Filters
        filters: Vec<Filter>,
    },
    /// Close a subscription
    Close(SubscriptionId),
    /// Answer an authentication challenge
    Auth(Box<Event>),
}

impl ClientMessage {
    /// `EVENT` message
    #[inline]
    pub fn event(event: Event) -> Self {
        Self::Event(Box::new(event))
    }

    /// `REQ` message
    #[inline]
    pub fn req(subscription_id: SubscriptionId, filters: Vec<Filter>) -> Self {
        Self::Req {
            subscription_id,
            filters,
        }
    }

    /// `COUNT` message
    #[inline]
    pub fn count(subscription_id: SubscriptionId, filters: Vec<Filter>) -> Self {
        Self::Count {
            subscription_id,
            filters,
        }
    }

    /// `CLOSE` message
    #[inline]
    pub fn close(subscription_id: SubscriptionId) -> Self {
        Self::Close(subscription_id)
    }

    /// `AUTH` message
    #[inline]
    pub fn auth(event: Event) -> Self {
        Self::Auth(Box::new(event))
    }

    /// Serialize as JSON array value
    pub fn as_value(&self) -> Value {
        match self {
            Self::Event(event) => json!(["EVENT", event]),
            Self::Req {
                subscription_id,
                filters,
            } => with_filters("REQ", subscription_id, filters),
            Self::Count {
                subscription_id,
                filters,
            } => with_filters("COUNT", subscription_id, filters),
            Self::Close(subscription_id) => json!(["CLOSE", subscription_id]),
            Self::Auth(event) => json!(["AUTH", event]),
        }
    }

    /// Serialize as JSON string
    #[inline]
    pub fn as_json(&self) -> String {
        self.as_value().to_string()
    }

    /// Serialize wrapped in a multiplexer routing envelope
    pub fn as_routed_json(&self, relays: &[RelayUrl]) -> String {
        let header = RoutingHeader {
            relays: relays.to_vec(),
        };
        json!([header, self.as_value()]).to_string()
    }
}

fn with_filters(verb: &str, subscription_id: &SubscriptionId, filters: &[Filter]) -> Value {
    let mut array: Vec<Value> = Vec::with_capacity(2 + filters.len());
    array.push(json!(verb));
    array.push(json!(subscription_id));
    array.extend(filters.iter().map(|f| json!(f)));
    Value::Array(array)
}

/// Messages sent by relays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// Event matching a subscription
    Event {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Event
        event: Box<Event>,
    },
    /// End of stored events
    EndOfStoredEvents(SubscriptionId),
    /// Acknowledgment of an `EVENT` or `AUTH`
    Ok {
        /// Event ID
        event_id: EventId,
        /// Accepted
        status: bool,
        /// Message
        message: String,
    },
    /// Authentication challenge
    Auth {
        /// Challenge
        challenge: String,
    },
    /// Count result
    Count {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Count
        count: usize,
    },
    /// Subscription closed by relay
    Closed {
        /// Subscription ID
        subscription_id: SubscriptionId,
        /// Message
        message: String,
    },
    /// Human-readable notice
    Notice(String),
}

impl RelayMessage {
    /// Deserialize from JSON array value
    pub fn from_value(msg: Value) -> Result<Self, MessageHandleError> {
        let mut v: Vec<Value> = match msg {
            Value::Array(v) => v,
            _ => return Err(MessageHandleError::InvalidMessageFormat),
        };

        if v.is_empty() {
            return Err(MessageHandleError::InvalidMessageFormat);
        }

        let verb: String = match v[0].as_str() {
            Some(verb) => verb.to_string(),
            None => return Err(MessageHandleError::InvalidMessageFormat),
        };

        match verb.as_str() {
            // ["EVENT", <subscription id>, <event JSON>]
            "EVENT" => {
                if v.len() != 3 {
                    return Err(MessageHandleError::InvalidMessageFormat);
                }
                let event: Value = normalize_event(v.remove(2))?;
                let subscription_id: SubscriptionId = serde_json::from_value(v.remove(1))?;
                let event: Event = serde_json::from_value(event)?;
                Ok(Self::Event {
                    subscription_id,
                    event: Box::new(event),
                })
            }
            // ["EOSE", <subscription id>]
            "EOSE" => {
                if v.len() != 2 {
                    return Err(MessageHandleError::InvalidMessageFormat);
                }
                let subscription_id: SubscriptionId = serde_json::from_value(v.remove(1))?;
                Ok(Self::EndOfStoredEvents(subscription_id))
            }
            // ["OK", <event id>, <true|false>, <message>]
            "OK" => {
                if v.len() < 3 {
                    return Err(MessageHandleError::InvalidMessageFormat);
                }
                let message: String = match v.get(3) {
                    Some(Value::String(message)) => message.clone(),
                    _ => String::new(),
                };
                let status: bool = v[2]
                    .as_bool()
                    .ok_or(MessageHandleError::InvalidMessageFormat)?;
                let event_id: EventId = serde_json::from_value(v.remove(1))?;
                Ok(Self::Ok {
                    event_id,
                    status,
                    message,
                })
            }
            // ["AUTH", <challenge>]
            "AUTH" => {
                let challenge: String = match v.get(1) {
                    Some(Value::String(challenge)) => challenge.clone(),
                    _ => return Err(MessageHandleError::InvalidMessageFormat),
                };
                Ok(Self::Auth { challenge })
            }
            // ["COUNT", <subscription id>, {"count": <integer>}]
            "COUNT" => {
                if v.len() < 3 {
                    return Err(MessageHandleError::InvalidMessageFormat);
                }
                let count: usize = v[2]
                    .get("count")
                    .and_then(Value::as_u64)
                    .ok_or(MessageHandleError::InvalidMessageFormat)?
                    as usize;
                let subscription_id: SubscriptionId = serde_json::from_value(v.remove(1))?;
                Ok(Self::Count {
                    subscription_id,
                    count,
                })
            }
            // ["CLOSED", <subscription id>, <message>]
            "CLOSED" => {
                if v.len() < 2 {
                    return Err(MessageHandleError::InvalidMessageFormat);
                }
                let message: String = match v.get(2) {
                    Some(Value::String(message)) => message.clone(),
                    _ => String::new(),
                };
                let subscription_id: SubscriptionId = serde_json::from_value(v.remove(1))?;
                Ok(Self::Closed {
                    subscription_id,
                    message,
                })
            }
            // ["NOTICE", <message>]
            "NOTICE" => match v.get(1) {
                Some(Value::String(message)) => Ok(Self::Notice(message.clone())),
                _ => Err(MessageHandleError::InvalidMessageFormat),
            },
            other => Err(MessageHandleError::UnknownMessage(other.to_string())),
        }
    }

    /// Deserialize from JSON string
    #[inline]
    pub fn from_json(json: &str) -> Result<Self, MessageHandleError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }
}

/// Ensure the event carries a `content` field, even if empty
fn normalize_event(event: Value) -> Result<Value, MessageHandleError> {
    let mut object: Map<String, Value> = match event {
        Value::Object(object) => object,
        _ => return Err(MessageHandleError::InvalidMessageFormat),
    };

    match object.get("content") {
        Some(Value::String(..)) => {}
        _ => {
            object.insert(String::from("content"), Value::String(String::new()));
        }
    }

    Ok(Value::Object(object))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoutingHeader {
    relays: Vec<RelayUrl>,
}

/// Inbound frame, attributed to its origin relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Origin relay
    pub relay_url: RelayUrl,
    /// Message
    pub message: RelayMessage,
}

/// Decode a socket text frame
///
/// Plain frames are attributed to `connection_url`. Frames wrapped in a
/// routing envelope produce one [`IncomingMessage`] per tagged relay.
pub fn decode_frame(
    connection_url: &RelayUrl,
    frame: &str,
) -> Result<Vec<IncomingMessage>, MessageHandleError> {
    let value: Value = serde_json::from_str(frame)?;

    let routed: bool = matches!(value.get(0), Some(Value::Object(..)));
    if !routed {
        return Ok(vec![IncomingMessage {
            relay_url: connection_url.clone(),
            message: RelayMessage::from_value(value)?,
        }]);
    }

    let mut v: Vec<Value> = match value {
        Value::Array(v) if v.len() == 2 => v,
        _ => return Err(MessageHandleError::InvalidMessageFormat),
    };

    let message: RelayMessage = RelayMessage::from_value(v.remove(1))?;
    let header: RoutingHeader = serde_json::from_value(v.remove(0))?;

    Ok(header
        .relays
        .into_iter()
        .map(|relay_url| IncomingMessage {
            relay_url,
            message: message.clone(),
        })
        .collect())
}
