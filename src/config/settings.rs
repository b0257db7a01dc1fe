//! Load test settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

/// Root configuration structure containing all load test settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Chat service under test
    pub target: TargetSettings,

    /// Virtual users, iterations and workers
    pub load: LoadSettings,

    /// Per-session timing and payload bounds
    pub session: SessionSettings,

    /// End of run reporting
    pub report: ReportSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Target chat service.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSettings {
    /// WebSocket endpoint (ws:// or wss://)
    pub url: String,

    /// Chat room every simulated client joins
    pub room_id: String,
}

/// How often the session duration is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationScope {
    /// One draw shared by every session of the run
    #[default]
    Run,
    /// One draw per iteration, shared by that iteration's workers
    Iteration,
    /// Independent draw for every session
    Session,
}

/// Load shape.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadSettings {
    /// Concurrent virtual users
    pub virtual_users: u32,

    /// Iterations performed by each virtual user
    pub iterations: u32,

    /// Sessions spawned per iteration
    pub workers_per_iteration: u32,

    /// Scope of the session duration draw
    pub session_duration_scope: DurationScope,
}

/// Session timing and payload bounds. All durations are in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Lower bound of the session duration (inclusive)
    pub duration_min_ms: u64,

    /// Upper bound of the session duration (inclusive)
    pub duration_max_ms: u64,

    /// Delay between leaving the room and closing the connection
    pub grace_period_ms: u64,

    /// Lower bound of the message period (inclusive)
    pub message_interval_min_ms: u64,

    /// Upper bound of the message period (exclusive)
    pub message_interval_max_ms: u64,

    /// Length of generated nicknames
    pub nickname_length: usize,

    /// Shortest generated message text (inclusive)
    pub text_length_min: usize,

    /// Longest generated message text (inclusive)
    pub text_length_max: usize,
}

/// Reporting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    /// Print Prometheus metrics once the run completes
    pub print_metrics: bool,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. Built-in defaults
    /// 2. config/default.toml
    /// 3. config/{RUN_ENV}.toml
    /// 4. `APP__` prefixed environment variables
    /// 5. `WS_URL`, `ROOM_ID`, `VUS`, `ITERATIONS` (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if any bound is inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__LOAD__VIRTUAL_USERS=50 -> load.virtual_users = 50
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("target.url", std::env::var("WS_URL").ok())?
            .set_override_option("target.room_id", std::env::var("ROOM_ID").ok())?
            .set_override_option("load.virtual_users", std::env::var("VUS").ok())?
            .set_override_option("load.iterations", std::env::var("ITERATIONS").ok())?
            .build()?
            .try_deserialize()
            .and_then(Self::validated)
    }

    /// Builder preloaded with every default.
    pub fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("target.url", "ws://127.0.0.1:3000/ws")?
            .set_default("target.room_id", "load-test")?
            .set_default("load.virtual_users", 10)?
            .set_default("load.iterations", 10)?
            .set_default("load.workers_per_iteration", 4)?
            .set_default("load.session_duration_scope", "run")?
            .set_default("session.duration_min_ms", 80000_u64)?
            .set_default("session.duration_max_ms", 100000_u64)?
            .set_default("session.grace_period_ms", 3000_u64)?
            .set_default("session.message_interval_min_ms", 3000_u64)?
            .set_default("session.message_interval_max_ms", 4000_u64)?
            .set_default("session.nickname_length", 7)?
            .set_default("session.text_length_min", 10)?
            .set_default("session.text_length_max", 30)?
            .set_default("report.print_metrics", true)
    }

    /// Check cross-field constraints after deserialization.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.target_url()?;

        let fail = |msg: &str| Err(ConfigError::Message(msg.to_string()));
        let load = &self.load;
        let session = &self.session;

        if load.virtual_users == 0 {
            return fail("load.virtual_users must be at least 1");
        }
        if load.workers_per_iteration == 0 {
            return fail("load.workers_per_iteration must be at least 1");
        }
        if session.duration_min_ms > session.duration_max_ms {
            return fail("session.duration_min_ms must not exceed session.duration_max_ms");
        }
        if session.grace_period_ms == 0 {
            return fail("session.grace_period_ms must be positive");
        }
        if session.message_interval_min_ms == 0
            || session.message_interval_min_ms >= session.message_interval_max_ms
        {
            return fail(
                "session.message_interval_min_ms must be positive and below message_interval_max_ms",
            );
        }
        if session.nickname_length == 0 {
            return fail("session.nickname_length must be positive");
        }
        if session.text_length_min > session.text_length_max {
            return fail("session.text_length_min must not exceed session.text_length_max");
        }

        Ok(self)
    }

    /// Parse and check the target endpoint.
    pub fn target_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.target.url)
            .map_err(|e| ConfigError::Message(format!("Invalid target.url: {}", e)))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ConfigError::Message(format!(
                "target.url must use ws or wss, got {}",
                other
            ))),
        }
    }
}

impl SessionSettings {
    /// Grace period as a `Duration`.
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}
