//! # Chat Load
//!
//! WebSocket load generator for a room-based chat service.
//!
//! This is the entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - The virtual users and their sessions

use anyhow::Result;
use tracing::info;

use chat_load::config::Settings;
use chat_load::infrastructure::metrics;
use chat_load::startup::LoadTest;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    chat_load::telemetry::init_tracing();

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        target_url = %settings.target.url,
        room_id = %settings.target.room_id,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let print_metrics = settings.report.print_metrics;
    let load_test = LoadTest::build(settings)?;
    load_test.run_until_complete().await?;

    if print_metrics {
        println!("{}", metrics::gather_metrics());
    }

    Ok(())
}
