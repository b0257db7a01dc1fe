//! # Domain Services
//!
//! Capabilities a session consumes without knowing how they are provided.
//! Each trait is implemented in the infrastructure layer and replaced by
//! fakes in tests.
//!
//! ## Services
//!
//! - **TimerScheduler**: Cancellable one-shot and repeating timers
//! - **Connector / ChatConnection**: Opening and writing to the chat socket
//! - **RandomSource**: Nickname, text and timing draws

mod random;
mod scheduler;
mod transport;

pub use random::*;
pub use scheduler::*;
pub use transport::*;
