//! Chat protocol codec.
//!
//! Encodes outbound envelopes for one room and decodes inbound broadcasts.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{
    BareEnvelope, ChatAction, ChatPayload, ClientMessage, IdentityPayload, InboundMessage,
    Nickname,
};
use crate::shared::error::{LoadError, Result};

/// Encoder bound to the room every message of a run targets.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    room_id: Arc<str>,
}

impl MessageCodec {
    pub fn new(room_id: impl Into<Arc<str>>) -> Self {
        Self {
            room_id: room_id.into(),
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Encode `action` for `nickname`, stamping `send_at` with the current time.
    pub fn encode(
        &self,
        action: &ChatAction,
        nickname: &Nickname,
        text: Option<&str>,
    ) -> Result<String> {
        self.encode_at(action, nickname, text, Utc::now())
    }

    /// Encode with an explicit `send_at`.
    ///
    /// `PUT_NICKNAME` ignores `text`. `SEND_MESSAGE` requires it. Any other
    /// action becomes a bare `{"action": ...}` envelope.
    pub fn encode_at(
        &self,
        action: &ChatAction,
        nickname: &Nickname,
        text: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let json = match action {
            ChatAction::PutNickname => serde_json::to_string(&ClientMessage::PutNickname(
                IdentityPayload {
                    nickname: nickname.to_string(),
                    room_id: self.room_id.to_string(),
                },
            ))?,
            ChatAction::SendMessage => {
                let text = text.ok_or(LoadError::MissingText)?;
                serde_json::to_string(&ClientMessage::SendMessage(ChatPayload {
                    nickname: nickname.to_string(),
                    room_id: self.room_id.to_string(),
                    text: text.to_string(),
                    send_at: format_timestamp(now),
                }))?
            }
            ChatAction::Other(name) => serde_json::to_string(&BareEnvelope {
                action: name.clone(),
            })?,
        };
        Ok(json)
    }
}

/// Decode a frame received from the chat service.
///
/// Fails only when the frame is not JSON; any JSON value decodes, with the
/// chat fields it lacks left empty.
pub fn decode(raw: &str) -> Result<InboundMessage> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    Ok(InboundMessage::from_value(&value))
}

/// Decode an envelope produced by [`MessageCodec`].
pub fn decode_client(raw: &str) -> Result<ClientMessage> {
    Ok(serde_json::from_str(raw)?)
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g.
/// `2024-01-01T12:00:00.123Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
