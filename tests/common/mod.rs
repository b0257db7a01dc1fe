//! Common Test Utilities
//!
//! An in-process chat server double and settings fixtures.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite;
use url::Url;

use chat_load::application::services::SessionSetup;
use chat_load::config::Settings;
use chat_load::domain::{
    ChatAction, ChatConnection, ClientMessage, Connector, EventSender, PayloadBounds,
    RandomSource, SessionEvent, SessionTiming,
};
use chat_load::infrastructure::websocket::decode_client;
use chat_load::infrastructure::{MessageCodec, ThreadRandom};
use chat_load::shared::Result;

pub const ROOM_ID: &str = "room-under-test";

/// Everything the server saw on one connection.
#[derive(Debug, Clone)]
pub struct RecordedConnection {
    pub opened_at: Instant,
    pub frames: Vec<(Instant, ClientMessage)>,
    pub close_requested_at: Option<Instant>,
}

impl RecordedConnection {
    pub fn nickname(&self) -> Option<&str> {
        self.frames.first().map(|(_, message)| message.nickname())
    }

    pub fn chat_messages(&self) -> Vec<(Instant, &ClientMessage)> {
        self.frames
            .iter()
            .filter(|(_, message)| message.action() == ChatAction::SendMessage)
            .map(|(at, message)| (*at, message))
            .collect()
    }
}

#[derive(Default)]
struct ServerState {
    attempts: usize,
    refused: HashSet<usize>,
    echo: bool,
    drop_after: Option<Duration>,
    connections: Vec<RecordedConnection>,
}

/// Connector that records every frame instead of touching the network.
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the nth connection attempt (0-based)
    pub fn refusing(self, attempt: usize) -> Self {
        self.state.lock().refused.insert(attempt);
        self
    }

    /// Broadcast every chat message back to its sender
    pub fn echoing(self) -> Self {
        self.state.lock().echo = true;
        self
    }

    /// Close each connection from the server side after `after`
    pub fn dropping_after(self, after: Duration) -> Self {
        self.state.lock().drop_after = Some(after);
        self
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    pub fn connections(&self) -> Vec<RecordedConnection> {
        self.state.lock().connections.clone()
    }
}

#[async_trait]
impl Connector for FakeServer {
    async fn connect(&self, _url: &Url, events: EventSender) -> Result<Box<dyn ChatConnection>> {
        let (index, echo, drop_after) = {
            let mut state = self.state.lock();
            let attempt = state.attempts;
            state.attempts += 1;

            if state.refused.contains(&attempt) {
                let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
                return Err(tungstenite::Error::Io(refused).into());
            }

            state.connections.push(RecordedConnection {
                opened_at: Instant::now(),
                frames: Vec::new(),
                close_requested_at: None,
            });
            (state.connections.len() - 1, state.echo, state.drop_after)
        };

        if let Some(after) = drop_after {
            let events = events.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let _ = events.send(SessionEvent::Closed);
            });
        }

        Ok(Box::new(FakeConnection {
            index,
            echo,
            events,
            state: self.state.clone(),
        }))
    }
}

struct FakeConnection {
    index: usize,
    echo: bool,
    events: EventSender,
    state: Arc<Mutex<ServerState>>,
}

impl ChatConnection for FakeConnection {
    fn send_text(&self, text: String) -> Result<()> {
        let message = decode_client(&text)?;

        if self.echo {
            if let ClientMessage::SendMessage(payload) = &message {
                let broadcast = serde_json::to_string(payload)?;
                let _ = self.events.send(SessionEvent::Message(broadcast));
            }
        }

        self.state.lock().connections[self.index]
            .frames
            .push((Instant::now(), message));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.state.lock().connections[self.index].close_requested_at = Some(Instant::now());
        let _ = self.events.send(SessionEvent::Closed);
        Ok(())
    }
}

/// Settings with test overrides on top of the defaults
pub fn settings(overrides: &[(&str, i64)]) -> Settings {
    let mut builder = Settings::builder("test")
        .unwrap()
        .set_override("target.room_id", ROOM_ID)
        .unwrap();
    for (key, value) in overrides {
        builder = builder.set_override(*key, *value).unwrap();
    }
    builder
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap()
        .validated()
        .unwrap()
}

pub fn setup(server: &FakeServer) -> SessionSetup {
    SessionSetup {
        url: Arc::new(Url::parse("ws://chat.test/ws").unwrap()),
        codec: MessageCodec::new(ROOM_ID),
        payload: PayloadBounds::default(),
        connector: Arc::new(server.clone()),
        random: Arc::new(ThreadRandom) as Arc<dyn RandomSource>,
    }
}

/// Reference timing: 80s session, 3s grace, 3-4s message interval
pub fn reference_timing() -> SessionTiming {
    SessionTiming::new(
        Duration::from_millis(80_000),
        Duration::from_millis(3_000),
        Duration::from_millis(3_000),
        Duration::from_millis(4_000),
    )
    .unwrap()
}

/// Assert `actual` is `expected` up to timer granularity
pub fn assert_near(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(5);
    assert!(
        actual >= expected && actual <= expected + slack,
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}
