//! # Chat Load Library
//!
//! A WebSocket load generator for room-based chat services. Each virtual
//! user runs iterations of concurrent simulated clients; every client joins
//! a room under a random nickname, posts random text on a timer, and leaves
//! after a drawn session duration plus a grace period.
//!
//! ## Architecture
//!
//! - **Domain Layer**: Session model, protocol messages, service traits
//! - **Application Layer**: Session lifecycle controller and worker pool
//! - **Infrastructure Layer**: WebSocket transport, timers, randomness, metrics
//!
//! ## Module Structure
//!
//! ```text
//! chat_load/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, and service traits
//! +-- application/    Session controller and worker pool
//! +-- infrastructure/ WebSocket, timers, randomness, metrics
//! +-- shared/         Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Session model
pub mod domain;

// Application layer - Session orchestration
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Shared utilities
pub mod shared;

// Load test wiring
pub mod startup;

// Telemetry and observability
pub mod telemetry;
