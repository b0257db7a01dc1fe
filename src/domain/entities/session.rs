//! Simulated chat session entity.
//!
//! A session is one simulated client's connect-to-disconnect run. This module
//! holds its identity, lifecycle phase, the events that drive it, and the
//! record of its scheduled timers.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::domain::services::{ChatConnection, TimerHandle, TimerKind};
use crate::domain::value_objects::Nickname;
use crate::shared::error::LoadError;

/// Identifies a session for logging. Only unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId {
    /// Virtual user running the iteration (1-based)
    pub vu: u32,
    /// Iteration number within the virtual user (0-based)
    pub iteration: u32,
    /// Worker index within the iteration (0-based)
    pub worker: u32,
}

impl SessionId {
    pub fn new(vu: u32, iteration: u32, worker: u32) -> Self {
        Self {
            vu,
            iteration,
            worker,
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VU {}:{}", self.vu, self.worker)
    }
}

/// Lifecycle phase.
///
/// ```text
/// Connecting -> Authenticating -> Active -> Leaving -> Disconnecting -> Closed
///     |                             |
///     +---------> Errored <---------+
/// ```
///
/// A close event moves any non-errored phase to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Connecting,
    Authenticating,
    Active,
    Leaving,
    Disconnecting,
    Closed,
    Errored,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Active => "active",
            Self::Leaving => "leaving",
            Self::Disconnecting => "disconnecting",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }

    /// The connection is (or may still be) open.
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            Self::Authenticating | Self::Active | Self::Leaving | Self::Disconnecting
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that can happen to a session, in delivery order.
pub enum SessionEvent {
    /// The socket opened; ownership of its write half moves to the session.
    Opened(Box<dyn ChatConnection>),
    /// Inbound text frame.
    Message(String),
    /// A scheduled timer fired.
    Timer(TimerKind),
    /// The connection closed, locally or remotely.
    Closed,
    /// Transport failure.
    Error(String),
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened(_) => f.write_str("Opened"),
            Self::Message(text) => f.debug_tuple("Message").field(text).finish(),
            Self::Timer(kind) => f.debug_tuple("Timer").field(kind).finish(),
            Self::Closed => f.write_str("Closed"),
            Self::Error(reason) => f.debug_tuple("Error").field(reason).finish(),
        }
    }
}

/// Identity and phase of one simulated client.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub room_id: Arc<str>,
    nickname: Option<Nickname>,
    phase: SessionPhase,
}

impl Session {
    pub fn new(id: SessionId, room_id: Arc<str>) -> Self {
        Self {
            id,
            room_id,
            nickname: None,
            phase: SessionPhase::Connecting,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Move to `next`, returning the previous phase.
    pub fn transition(&mut self, next: SessionPhase) -> SessionPhase {
        std::mem::replace(&mut self.phase, next)
    }

    pub fn nickname(&self) -> Option<&Nickname> {
        self.nickname.as_ref()
    }

    /// Set the nickname. It can only be assigned once.
    pub fn assign_nickname(&mut self, nickname: Nickname) -> Result<&Nickname, LoadError> {
        if let Some(existing) = &self.nickname {
            return Err(LoadError::InvalidNickname(format!(
                "session already announced as {}",
                existing
            )));
        }
        Ok(self.nickname.insert(nickname))
    }
}

/// The three named timers of a session.
///
/// All cancellation goes through this record. Dropping it cancels whatever
/// is still pending.
#[derive(Debug, Default)]
pub struct SessionTimers {
    message: Option<TimerHandle>,
    leave: Option<TimerHandle>,
    disconnect: Option<TimerHandle>,
}

impl SessionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Message => &mut self.message,
            TimerKind::Leave => &mut self.leave,
            TimerKind::Disconnect => &mut self.disconnect,
        }
    }

    pub fn get(&self, kind: TimerKind) -> Option<&TimerHandle> {
        match kind {
            TimerKind::Message => self.message.as_ref(),
            TimerKind::Leave => self.leave.as_ref(),
            TimerKind::Disconnect => self.disconnect.as_ref(),
        }
    }

    /// Store a handle under its kind, cancelling any handle it replaces.
    pub fn insert(&mut self, handle: TimerHandle) {
        if let Some(previous) = self.slot(handle.kind()).replace(handle) {
            previous.cancel();
        }
    }

    /// Cancel one timer. Safe on missing, fired or cancelled handles.
    pub fn cancel(&self, kind: TimerKind) -> bool {
        self.get(kind).map(TimerHandle::cancel).unwrap_or(false)
    }

    /// Cancel every pending timer, returning how many were still active.
    pub fn cancel_all(&self) -> usize {
        [TimerKind::Message, TimerKind::Leave, TimerKind::Disconnect]
            .into_iter()
            .filter(|kind| self.cancel(*kind))
            .count()
    }

    /// Whether a firing of `kind` should still be acted on.
    pub fn accepts(&self, kind: TimerKind) -> bool {
        self.get(kind).is_some_and(|handle| !handle.is_cancelled())
    }

    /// Number of timers that can still fire.
    pub fn active_count(&self) -> usize {
        [&self.message, &self.leave, &self.disconnect]
            .into_iter()
            .flatten()
            .filter(|handle| handle.is_active())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.leave.is_none() && self.disconnect.is_none()
    }
}

impl Drop for SessionTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
