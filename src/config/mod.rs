//! # Configuration Module
//!
//! This module handles load test configuration loading and management.
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//! - Short overrides: WS_URL, ROOM_ID, VUS, ITERATIONS
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_load::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Targeting {} room {}", settings.target.url, settings.target.room_id);
//! ```

mod settings;

pub use settings::*;
