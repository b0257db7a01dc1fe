//! Session timing and payload bounds.
//!
//! Both types are validated on construction so the controller can rely on
//! their invariants without re-checking:
//!
//! - the disconnect delay is always strictly greater than the leave delay
//! - the message interval range is non-empty and starts above zero

use std::time::Duration;

use crate::config::SessionSettings;
use crate::shared::error::LoadError;

/// Timer delays for one session, all relative to the moment it becomes active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    session_duration: Duration,
    grace_period: Duration,
    interval_min: Duration,
    interval_max: Duration,
}

impl SessionTiming {
    /// Build a timing profile.
    ///
    /// `interval_max` is exclusive: periods are drawn from
    /// `[interval_min, interval_max)`.
    pub fn new(
        session_duration: Duration,
        grace_period: Duration,
        interval_min: Duration,
        interval_max: Duration,
    ) -> Result<Self, LoadError> {
        if grace_period.is_zero() {
            return Err(LoadError::Validation("grace period must be positive".into()));
        }
        if interval_min.is_zero() || interval_min >= interval_max {
            return Err(LoadError::Validation(format!(
                "message interval [{:?}, {:?}) is empty",
                interval_min, interval_max
            )));
        }

        Ok(Self {
            session_duration,
            grace_period,
            interval_min,
            interval_max,
        })
    }

    /// Timing for a session whose duration has already been drawn.
    pub fn from_settings(
        settings: &SessionSettings,
        session_duration: Duration,
    ) -> Result<Self, LoadError> {
        Self::new(
            session_duration,
            settings.grace_period(),
            Duration::from_millis(settings.message_interval_min_ms),
            Duration::from_millis(settings.message_interval_max_ms),
        )
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// When the session stops sending chat messages.
    pub fn leave_delay(&self) -> Duration {
        self.session_duration
    }

    /// When the session closes its connection.
    pub fn disconnect_delay(&self) -> Duration {
        self.session_duration + self.grace_period
    }

    /// Inclusive millisecond bounds for drawing the message period.
    pub fn interval_bounds_ms(&self) -> (u64, u64) {
        let min = self.interval_min.as_millis() as u64;
        let max = self.interval_max.as_millis() as u64;
        (min, max.saturating_sub(1).max(min))
    }
}

/// Generated payload sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadBounds {
    pub nickname_length: usize,
    pub text_length_min: usize,
    pub text_length_max: usize,
}

impl PayloadBounds {
    pub fn new(
        nickname_length: usize,
        text_length_min: usize,
        text_length_max: usize,
    ) -> Result<Self, LoadError> {
        if nickname_length == 0 {
            return Err(LoadError::Validation("nickname length must be positive".into()));
        }
        if text_length_min > text_length_max {
            return Err(LoadError::Validation(format!(
                "text length range {}..={} is empty",
                text_length_min, text_length_max
            )));
        }
        Ok(Self {
            nickname_length,
            text_length_min,
            text_length_max,
        })
    }

    pub fn from_settings(settings: &SessionSettings) -> Result<Self, LoadError> {
        Self::new(
            settings.nickname_length,
            settings.text_length_min,
            settings.text_length_max,
        )
    }
}

impl Default for PayloadBounds {
    fn default() -> Self {
        Self {
            nickname_length: 7,
            text_length_min: 10,
            text_length_max: 30,
        }
    }
}
