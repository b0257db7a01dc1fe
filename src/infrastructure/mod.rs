//! # Infrastructure Layer
//!
//! Concrete implementations of the domain service traits.
//!
//! - **websocket**: `tokio-tungstenite` connector and the JSON codec
//! - **timer**: Timer scheduler on `tokio::time`
//! - **random**: `rand`-backed random source
//! - **metrics**: Prometheus counters for the run

pub mod metrics;
pub mod random;
pub mod timer;
pub mod websocket;

pub use random::ThreadRandom;
pub use timer::TokioScheduler;
pub use websocket::{MessageCodec, WsConnector};
