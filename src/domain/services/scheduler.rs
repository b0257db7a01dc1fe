//! Timer scheduling contract.
//!
//! A [`TimerScheduler`] turns "fire `kind` after/every N" into a
//! [`TimerHandle`]. Firings are delivered to the owning session's event
//! queue; the handle is the only way to stop them.
//!
//! ## Handle states
//!
//! ```text
//! Active --fire (one-shot)--> Fired
//!   |
//!   +-----cancel-----------> Cancelled
//! ```
//!
//! `Fired` and `Cancelled` are terminal. Cancelling a handle that is not
//! `Active` does nothing and returns `false`.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Which of a session's timers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Repeating chat message tick
    Message,
    /// One-shot: stop sending chat messages
    Leave,
    /// One-shot: close the connection
    Disconnect,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Leave => "leave",
            Self::Disconnect => "disconnect",
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ACTIVE: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

type Canceller = Box<dyn FnOnce() + Send>;

struct TimerInner {
    kind: TimerKind,
    state: AtomicU8,
    canceller: Mutex<Option<Canceller>>,
}

/// Cancellable handle to a scheduled timer.
///
/// Clones share state: the scheduler keeps one clone to check for
/// cancellation before each firing, the session keeps another to cancel.
#[derive(Clone)]
pub struct TimerHandle {
    inner: Arc<TimerInner>,
}

impl TimerHandle {
    /// Create an active handle with no cancellation hook.
    pub fn new(kind: TimerKind) -> Self {
        Self {
            inner: Arc::new(TimerInner {
                kind,
                state: AtomicU8::new(ACTIVE),
                canceller: Mutex::new(None),
            }),
        }
    }

    /// Attach a hook run once on the first successful cancel, e.g. aborting
    /// the task backing the timer. Runs immediately if already cancelled.
    pub fn on_cancel(self, hook: impl FnOnce() + Send + 'static) -> Self {
        if self.is_cancelled() {
            hook();
        } else {
            *self.inner.canceller.lock() = Some(Box::new(hook));
            // cancel() may have raced between the check and the store
            if self.is_cancelled() {
                if let Some(hook) = self.inner.canceller.lock().take() {
                    hook();
                }
            }
        }
        self
    }

    pub fn kind(&self) -> TimerKind {
        self.inner.kind
    }

    /// Stop all future firings. Returns `true` only for the call that
    /// actually cancelled an active timer.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .inner
            .state
            .compare_exchange(ACTIVE, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if cancelled {
            if let Some(hook) = self.inner.canceller.lock().take() {
                hook();
            }
        }
        cancelled
    }

    /// Mark a one-shot timer as fired. Returns `false` if it was cancelled
    /// (or already fired), in which case the firing must be dropped.
    pub fn fire_once(&self) -> bool {
        let fired = self
            .inner
            .state
            .compare_exchange(ACTIVE, FIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if fired {
            // Nothing left to abort
            self.inner.canceller.lock().take();
        }
        fired
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == ACTIVE
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == CANCELLED
    }

    pub fn has_fired(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == FIRED
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.state.load(Ordering::Acquire) {
            ACTIVE => "active",
            FIRED => "fired",
            _ => "cancelled",
        };
        f.debug_struct("TimerHandle")
            .field("kind", &self.inner.kind)
            .field("state", &state)
            .finish()
    }
}

/// Schedules timers for a single session.
///
/// Implementations deliver each firing as `SessionEvent::Timer(kind)` to the
/// session that owns the scheduler, and must check the handle before every
/// delivery so a cancelled timer never fires again.
pub trait TimerScheduler: Send + Sync {
    /// Fire `kind` once after `delay`.
    fn schedule_once(&self, kind: TimerKind, delay: Duration) -> TimerHandle;

    /// Fire `kind` every `period`, first one period from now, until cancelled.
    fn schedule_repeating(&self, kind: TimerKind, period: Duration) -> TimerHandle;
}
