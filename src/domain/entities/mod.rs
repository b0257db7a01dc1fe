//! # Domain Entities
//!
//! Core objects of a load test run.
//!
//! - **Session**: One simulated client's run, its phase and timers
//! - **SessionEvent**: Socket and timer events that drive a session
//! - **ClientMessage / InboundMessage**: Chat protocol messages

mod message;
mod session;

// Re-export Session entity and related types
pub use session::{Session, SessionEvent, SessionId, SessionPhase, SessionTimers};

// Re-export Message entity and related types
pub use message::{
    BareEnvelope, ChatAction, ChatPayload, ClientMessage, IdentityPayload, InboundMessage,
};
