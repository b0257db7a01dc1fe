//! Connection contract between a session and the wire.

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::domain::entities::SessionEvent;
use crate::shared::error::Result;

/// Queue feeding a session's event loop.
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Write half of an established connection, owned by exactly one session.
///
/// Both calls are non-blocking: frames are queued for a writer task.
pub trait ChatConnection: Send {
    /// Queue a text frame.
    fn send_text(&self, text: String) -> Result<()>;

    /// Start a graceful close. The session learns the connection is gone
    /// from the `SessionEvent::Closed` that follows.
    fn close(&self) -> Result<()>;
}

/// Opens connections to the chat service.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `url`.
    ///
    /// Inbound frames, errors and the final close are pushed to `events`.
    /// `SessionEvent::Opened` is not: the caller delivers it with the
    /// returned connection.
    async fn connect(&self, url: &Url, events: EventSender) -> Result<Box<dyn ChatConnection>>;
}
