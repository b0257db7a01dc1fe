//! Application Services
//!
//! ## Available Services
//!
//! - **SessionController**: Lifecycle state machine of one simulated client
//! - **WorkerPool**: Spawns and awaits the sessions of one iteration

pub mod session_controller;
pub mod worker_pool;

pub use session_controller::{run_session, SessionController, SessionReport, SessionSetup};
pub use worker_pool::{IterationContext, WorkerPool};
