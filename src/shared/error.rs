//! Load Generator Error Types
//!
//! Centralized error handling for sessions, transport and configuration.

use tokio_tungstenite::tungstenite;

/// Load generator error type
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection timed out after {0}ms")]
    ConnectTimeout(u64),

    #[error("SEND_MESSAGE requires message text")]
    MissingText,

    #[error("Invalid nickname: {0}")]
    InvalidNickname(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl LoadError {
    /// Whether the error came from the wire rather than from our own data.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LoadError::WebSocket(_) | LoadError::ConnectionClosed | LoadError::ConnectTimeout(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LoadError>;
