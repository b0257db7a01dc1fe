//! # Domain Layer
//!
//! The domain layer contains the session model of the load generator.
//! It knows nothing about sockets or runtimes beyond the traits it defines.
//!
//! ## Structure
//!
//! - **entities**: Session, its events and timers, protocol messages
//! - **value_objects**: Nickname, session timing and payload bounds
//! - **services**: Scheduler, transport and randomness contracts
//!
//! ## Design Principles
//!
//! - Infrastructure implements the service traits
//! - Entities enforce their own invariants (single nickname, idempotent cancel)

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
pub use value_objects::*;
