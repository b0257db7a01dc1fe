//! Chat protocol messages.
//!
//! Outbound messages are an adjacently tagged enum so the action name and the
//! payload shape always agree:
//!
//! ```json
//! {"action": "PUT_NICKNAME", "data": {"nickname": "...", "room_id": "..."}}
//! {"action": "SEND_MESSAGE", "data": {"nickname": "...", "room_id": "...", "text": "...", "send_at": "..."}}
//! ```
//!
//! Inbound messages are whatever the server rebroadcasts. Any JSON value is
//! accepted; the fields a chat broadcast carries are picked out when present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Action discriminant on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChatAction {
    PutNickname,
    SendMessage,
    /// Any other action, sent as a bare envelope
    Other(String),
}

impl ChatAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PutNickname => "PUT_NICKNAME",
            Self::SendMessage => "SEND_MESSAGE",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ChatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `PUT_NICKNAME` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPayload {
    pub nickname: String,
    pub room_id: String,
}

/// `SEND_MESSAGE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub nickname: String,
    pub room_id: String,
    pub text: String,
    /// ISO-8601 instant the message was encoded
    pub send_at: String,
}

/// Message sent by a simulated client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    PutNickname(IdentityPayload),
    SendMessage(ChatPayload),
}

impl ClientMessage {
    pub fn action(&self) -> ChatAction {
        match self {
            Self::PutNickname(_) => ChatAction::PutNickname,
            Self::SendMessage(_) => ChatAction::SendMessage,
        }
    }

    pub fn nickname(&self) -> &str {
        match self {
            Self::PutNickname(p) => &p.nickname,
            Self::SendMessage(p) => &p.nickname,
        }
    }

    pub fn room_id(&self) -> &str {
        match self {
            Self::PutNickname(p) => &p.room_id,
            Self::SendMessage(p) => &p.room_id,
        }
    }
}

/// Envelope for actions without a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BareEnvelope {
    pub action: String,
}

/// Message received from the chat service.
///
/// Fields missing from the frame, or not strings, are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    pub nickname: Option<String>,
    pub text: Option<String>,
    pub room_id: Option<String>,
    /// Sender's timestamp, as forwarded by the server
    pub send_at: Option<String>,
}

impl InboundMessage {
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_owned);
        Self {
            nickname: field("nickname"),
            text: field("text"),
            room_id: field("room_id"),
            send_at: field("send_at"),
        }
    }

    /// Time between the sender encoding the message and `now`, when the
    /// server forwarded an RFC 3339 `send_at`.
    pub fn latency_at(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        let sent = DateTime::parse_from_rfc3339(self.send_at.as_deref()?).ok()?;
        (now - sent.with_timezone(&Utc)).to_std().ok()
    }
}
