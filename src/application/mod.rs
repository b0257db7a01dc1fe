//! Application Layer
//!
//! Orchestrates sessions: the per-client lifecycle controller and the
//! pool that runs an iteration's clients side by side.

pub mod services;
