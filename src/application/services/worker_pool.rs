//! Worker Pool Spawner
//!
//! Starts the sessions of one iteration side by side and waits for all of
//! them. Sessions share nothing but the read-only [`SessionSetup`]; one
//! failing never touches the others.

use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::application::services::session_controller::{run_session, SessionSetup};
use crate::config::SessionSettings;
use crate::domain::{SessionId, SessionTiming};
use crate::shared::error::Result;

/// Where an iteration sits in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationContext {
    pub vu: u32,
    pub iteration: u32,
    /// Shared session duration; `None` draws one per session.
    pub session_duration: Option<Duration>,
}

pub struct WorkerPool {
    setup: SessionSetup,
    settings: SessionSettings,
    workers: u32,
}

impl WorkerPool {
    /// Build a pool, rejecting session settings that cannot produce a timing.
    pub fn new(setup: SessionSetup, settings: SessionSettings, workers: u32) -> Result<Self> {
        SessionTiming::from_settings(
            &settings,
            Duration::from_millis(settings.duration_min_ms),
        )?;

        Ok(Self {
            setup,
            settings,
            workers,
        })
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }

    /// Draw a session duration from the configured range.
    pub fn draw_session_duration(&self) -> Duration {
        Duration::from_millis(
            self.setup
                .random
                .int_between(self.settings.duration_min_ms, self.settings.duration_max_ms),
        )
    }

    /// Run `workers` sessions concurrently and wait until every one ends.
    pub async fn run_iteration(&self, context: IterationContext) {
        let mut sessions = JoinSet::new();

        for worker in 0..self.workers {
            let id = SessionId::new(context.vu, context.iteration, worker);
            let duration = context
                .session_duration
                .unwrap_or_else(|| self.draw_session_duration());

            let timing = match SessionTiming::from_settings(&self.settings, duration) {
                Ok(timing) => timing,
                Err(e) => {
                    error!(session = %id, error = %e, "Invalid session timing, worker skipped");
                    continue;
                }
            };

            sessions.spawn(run_session(id, self.setup.clone(), timing));
        }

        while let Some(joined) = sessions.join_next().await {
            match joined {
                Ok(report) => debug!(
                    session = %report.id,
                    phase = %report.phase,
                    sent = report.messages_sent,
                    received = report.messages_received,
                    "Session finished"
                ),
                Err(e) => error!(
                    vu = context.vu,
                    iteration = context.iteration,
                    error = %e,
                    "Session task failed"
                ),
            }
        }

        debug!(vu = context.vu, iteration = context.iteration, "Iteration complete");
    }
}
