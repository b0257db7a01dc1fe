//! Tokio timer scheduler.
//!
//! Every timer is a spawned task that sleeps and then pushes
//! `SessionEvent::Timer(kind)` into the session's queue. Cancelling the
//! handle aborts the task; the task also checks the handle before each
//! delivery, so a firing racing with `cancel` is dropped.

use std::time::Duration;

use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use crate::domain::{EventSender, SessionEvent, TimerHandle, TimerKind, TimerScheduler};

/// Scheduler delivering firings to one session's event queue.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    events: EventSender,
}

impl TokioScheduler {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl TimerScheduler for TokioScheduler {
    fn schedule_once(&self, kind: TimerKind, delay: Duration) -> TimerHandle {
        let handle = TimerHandle::new(kind);
        let timer = handle.clone();
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            sleep(delay).await;
            if timer.fire_once() {
                let _ = events.send(SessionEvent::Timer(kind));
            }
        });

        let abort = task.abort_handle();
        handle.on_cancel(move || abort.abort())
    }

    fn schedule_repeating(&self, kind: TimerKind, period: Duration) -> TimerHandle {
        let handle = TimerHandle::new(kind);
        let timer = handle.clone();
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                if !timer.is_active() || events.send(SessionEvent::Timer(kind)).is_err() {
                    break;
                }
            }
        });

        let abort = task.abort_handle();
        handle.on_cancel(move || abort.abort())
    }
}
