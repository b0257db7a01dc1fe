//! Load Test Startup
//!
//! Wires settings into a worker pool and drives the virtual users.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::application::services::{IterationContext, SessionSetup, WorkerPool};
use crate::config::{DurationScope, Settings};
use crate::domain::{Connector, PayloadBounds, RandomSource};
use crate::infrastructure::metrics::{self, RunTotals};
use crate::infrastructure::{MessageCodec, ThreadRandom, WsConnector};
use crate::shared::error::Result;

/// A configured load test, ready to run.
pub struct LoadTest {
    run_id: Uuid,
    settings: Arc<Settings>,
    pool: Arc<WorkerPool>,
}

impl LoadTest {
    /// Build a load test against the real WebSocket endpoint
    pub fn build(settings: Settings) -> Result<Self> {
        Self::with_components(
            settings,
            Arc::new(WsConnector::default()),
            Arc::new(ThreadRandom),
        )
    }

    /// Build with a custom transport and random source
    pub fn with_components(
        settings: Settings,
        connector: Arc<dyn Connector>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        let setup = SessionSetup {
            url: Arc::new(settings.target_url()?),
            codec: MessageCodec::new(settings.target.room_id.as_str()),
            payload: PayloadBounds::from_settings(&settings.session)?,
            connector,
            random,
        };

        let pool = WorkerPool::new(
            setup,
            settings.session.clone(),
            settings.load.workers_per_iteration,
        )?;

        Ok(Self {
            run_id: Uuid::new_v4(),
            settings: Arc::new(settings),
            pool: Arc::new(pool),
        })
    }

    /// Run every virtual user to completion and return the run totals.
    ///
    /// Virtual users run concurrently; each performs its iterations one
    /// after another.
    pub async fn run_until_complete(self) -> Result<RunTotals> {
        let load = &self.settings.load;
        let scope = load.session_duration_scope;
        let run_duration = match scope {
            DurationScope::Run => Some(self.pool.draw_session_duration()),
            DurationScope::Iteration | DurationScope::Session => None,
        };

        info!(
            run_id = %self.run_id,
            target = %self.settings.target.url,
            room_id = %self.settings.target.room_id,
            vus = load.virtual_users,
            iterations = load.iterations,
            workers = self.pool.workers(),
            ?scope,
            session_duration_ms = run_duration.map(|d| d.as_millis() as u64),
            "Starting load test"
        );

        let started = Instant::now();
        let mut users = JoinSet::new();

        for vu in 1..=load.virtual_users {
            let pool = self.pool.clone();
            let iterations = load.iterations;

            users.spawn(async move {
                for iteration in 0..iterations {
                    let session_duration = iteration_duration(&pool, scope, run_duration);
                    pool.run_iteration(IterationContext {
                        vu,
                        iteration,
                        session_duration,
                    })
                    .await;
                }
            });
        }

        while let Some(joined) = users.join_next().await {
            if let Err(e) = joined {
                error!(run_id = %self.run_id, error = %e, "Virtual user task failed");
            }
        }

        let totals = metrics::run_totals();
        info!(
            run_id = %self.run_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            sessions_started = totals.sessions_started,
            sessions_closed = totals.sessions_closed,
            sessions_errored = totals.sessions_errored,
            messages_sent = totals.messages_sent,
            messages_received = totals.messages_received,
            decode_failures = totals.decode_failures,
            "Load test complete"
        );

        Ok(totals)
    }
}

fn iteration_duration(
    pool: &WorkerPool,
    scope: DurationScope,
    run_duration: Option<Duration>,
) -> Option<Duration> {
    match scope {
        DurationScope::Run => run_duration,
        DurationScope::Iteration => Some(pool.draw_session_duration()),
        DurationScope::Session => None,
    }
}
