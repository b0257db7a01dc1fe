//! WebSocket Client
//!
//! Wire codec and `tokio-tungstenite` connector for the chat protocol.

pub mod codec;
pub mod connection;

pub use codec::{decode, decode_client, format_timestamp, MessageCodec};
pub use connection::{WsConnection, WsConnector, DEFAULT_CLOSE_TIMEOUT, DEFAULT_CONNECT_TIMEOUT};
