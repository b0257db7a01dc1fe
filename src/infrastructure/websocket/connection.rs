//! WebSocket transport.
//!
//! Each connection runs two tasks:
//!
//! - a writer draining a command channel into the socket
//! - a reader turning frames into `SessionEvent`s
//!
//! The reader always finishes with exactly one `SessionEvent::Closed`, after
//! an optional `SessionEvent::Error`. Once the writer has started a close, the
//! reader waits at most the close timeout for the server's reply before it
//! drops the socket.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, timeout_at, Instant};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, trace};
use url::Url;

use crate::domain::{ChatConnection, Connector, EventSender, SessionEvent};
use crate::shared::error::{LoadError, Result};

/// Default time allowed for the TCP + TLS + upgrade handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed for the server to answer our close frame.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Commands for the writer task.
enum Outgoing {
    Text(String),
    Close,
}

/// Write half handed to the session.
pub struct WsConnection {
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl ChatConnection for WsConnection {
    fn send_text(&self, text: String) -> Result<()> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| LoadError::ConnectionClosed)
    }

    fn close(&self) -> Result<()> {
        self.outgoing
            .send(Outgoing::Close)
            .map_err(|_| LoadError::ConnectionClosed)
    }
}

/// Opens chat connections with `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
    close_timeout: Duration,
}

impl WsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        // wss:// needs a process-wide crypto provider; a second install is a no-op
        let _ = rustls::crypto::ring::default_provider().install_default();
        Self {
            connect_timeout,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    /// Bound the wait for the server's close reply.
    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url, events: EventSender) -> Result<Box<dyn ChatConnection>> {
        let (stream, response) = timeout(
            self.connect_timeout,
            tokio_tungstenite::connect_async(url.as_str()),
        )
        .await
        .map_err(|_| LoadError::ConnectTimeout(self.connect_timeout.as_millis() as u64))??;

        debug!(url = %url, status = %response.status(), "WebSocket connected");

        let (mut sink, mut frames) = stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Outgoing>();
        let (closing_tx, mut closing_rx) = oneshot::channel::<()>();
        let close_timeout = self.close_timeout;

        tokio::spawn(async move {
            while let Some(command) = outgoing_rx.recv().await {
                match command {
                    Outgoing::Text(text) => {
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            debug!(error = %e, "WebSocket write failed");
                            break;
                        }
                    }
                    Outgoing::Close => break,
                }
            }
            // Start the reader's close deadline before the close frame can block
            let _ = closing_tx.send(());
            let _ = timeout(close_timeout, sink.close()).await;
        });

        tokio::spawn(async move {
            let mut close_deadline: Option<Instant> = None;

            loop {
                let next = match close_deadline {
                    None => tokio::select! {
                        frame = frames.next() => frame,
                        _ = &mut closing_rx => {
                            close_deadline = Some(Instant::now() + close_timeout);
                            continue;
                        }
                    },
                    Some(deadline) => match timeout_at(deadline, frames.next()).await {
                        Ok(frame) => frame,
                        Err(_) => {
                            debug!(
                                timeout_ms = close_timeout.as_millis() as u64,
                                "Close handshake timed out, dropping socket"
                            );
                            break;
                        }
                    },
                };

                let Some(frame) = next else {
                    break;
                };
                match frame {
                    Ok(Message::Text(text)) => {
                        let event = SessionEvent::Message(text.as_str().to_owned());
                        if events.send(event).is_err() {
                            // Session is gone; dropping the stream releases the socket
                            return;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        trace!(?frame, "Close frame received");
                    }
                    Ok(_) => {}
                    Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,
                    Err(e) => {
                        let _ = events.send(SessionEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            drop(frames);
            let _ = events.send(SessionEvent::Closed);
        });

        Ok(Box::new(WsConnection {
            outgoing: outgoing_tx,
        }))
    }
}
