//! Session Lifecycle Controller
//!
//! Drives one simulated client from connect to disconnect. Every socket and
//! timer event goes through [`SessionController::handle`], so the lifecycle
//! can be exercised without a network or a runtime clock.
//!
//! ```text
//! Opened      Connecting    -> Authenticating -> Active   (PUT_NICKNAME, 3 timers)
//! Timer(Msg)  Active        -> Active                     (SEND_MESSAGE)
//! Timer(Lv)   Active        -> Leaving                    (message timer cancelled)
//! Timer(Dc)   Leaving       -> Disconnecting              (close requested)
//! Closed      *             -> Closed                     (all timers cancelled)
//! Error       Connecting|Active -> Errored
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::domain::{
    ChatAction, ChatConnection, Connector, Nickname, PayloadBounds, RandomSource, Session,
    SessionEvent, SessionId, SessionPhase, SessionTimers, SessionTiming, TimerKind,
    TimerScheduler,
};
use crate::infrastructure::metrics::{self, SessionOutcome};
use crate::infrastructure::websocket::{decode, MessageCodec};
use crate::infrastructure::TokioScheduler;
use crate::shared::error::{LoadError, Result};

/// What a session did, for logging and tests.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub id: SessionId,
    pub phase: SessionPhase,
    pub nickname: Option<String>,
    pub message_interval: Option<Duration>,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub decode_failures: u64,
    pub active_at: Option<Instant>,
    pub left_at: Option<Instant>,
    pub disconnect_at: Option<Instant>,
    pub closed_at: Option<Instant>,
}

impl SessionReport {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            phase: SessionPhase::Connecting,
            nickname: None,
            message_interval: None,
            messages_sent: 0,
            messages_received: 0,
            decode_failures: 0,
            active_at: None,
            left_at: None,
            disconnect_at: None,
            closed_at: None,
        }
    }
}

/// State machine for one simulated client.
pub struct SessionController {
    session: Session,
    timing: SessionTiming,
    payload: PayloadBounds,
    codec: MessageCodec,
    scheduler: Arc<dyn TimerScheduler>,
    random: Arc<dyn RandomSource>,
    connection: Option<Box<dyn ChatConnection>>,
    timers: SessionTimers,
    report: SessionReport,
    cleaned_up: bool,
}

impl SessionController {
    pub fn new(
        id: SessionId,
        codec: MessageCodec,
        timing: SessionTiming,
        payload: PayloadBounds,
        scheduler: Arc<dyn TimerScheduler>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            session: Session::new(id, Arc::from(codec.room_id())),
            timing,
            payload,
            codec,
            scheduler,
            random,
            connection: None,
            timers: SessionTimers::new(),
            report: SessionReport::new(id),
            cleaned_up: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn nickname(&self) -> Option<&Nickname> {
        self.session.nickname()
    }

    pub fn timers(&self) -> &SessionTimers {
        &self.timers
    }

    /// Nothing more will happen to this session.
    pub fn is_finished(&self) -> bool {
        self.cleaned_up
            || (self.session.phase() == SessionPhase::Errored && self.connection.is_none())
    }

    pub fn report(&self) -> SessionReport {
        let mut report = self.report.clone();
        report.phase = self.session.phase();
        report.nickname = self.session.nickname().map(|n| n.to_string());
        report
    }

    /// Apply one event.
    ///
    /// Errors are per-event (a frame that failed to decode, a write to a
    /// connection that is already gone); the session keeps going and the
    /// caller only logs them.
    pub fn handle(&mut self, event: SessionEvent) -> Result<()> {
        trace!(session = %self.session.id, phase = %self.session.phase(), ?event, "Session event");

        match event {
            SessionEvent::Opened(connection) => self.on_open(connection),
            SessionEvent::Message(raw) => self.on_message(&raw),
            SessionEvent::Timer(kind) => self.on_timer(kind),
            SessionEvent::Closed => {
                self.on_close();
                Ok(())
            }
            SessionEvent::Error(reason) => {
                self.on_error(&reason);
                Ok(())
            }
        }
    }

    fn on_open(&mut self, connection: Box<dyn ChatConnection>) -> Result<()> {
        if self.session.phase() != SessionPhase::Connecting {
            warn!(session = %self.session.id, phase = %self.session.phase(), "Unexpected open event");
            return Ok(());
        }

        self.connection = Some(connection);
        metrics::connection_opened();
        self.session.transition(SessionPhase::Authenticating);

        let nickname = Nickname::new(self.random.string(self.payload.nickname_length))?;
        let nickname = self.session.assign_nickname(nickname)?.clone();
        self.send(&ChatAction::PutNickname, &nickname, None)?;

        // No acknowledgment for PUT_NICKNAME: active as soon as it is queued
        self.enter_active(&nickname);
        Ok(())
    }

    fn enter_active(&mut self, nickname: &Nickname) {
        self.session.transition(SessionPhase::Active);
        self.report.active_at = Some(Instant::now());

        let (min, max) = self.timing.interval_bounds_ms();
        let period = Duration::from_millis(self.random.int_between(min, max));
        self.report.message_interval = Some(period);

        self.timers
            .insert(self.scheduler.schedule_repeating(TimerKind::Message, period));
        self.timers
            .insert(self.scheduler.schedule_once(TimerKind::Leave, self.timing.leave_delay()));
        self.timers.insert(
            self.scheduler
                .schedule_once(TimerKind::Disconnect, self.timing.disconnect_delay()),
        );

        info!(
            session = %self.session.id,
            nickname = %nickname,
            interval_ms = period.as_millis() as u64,
            duration_ms = self.timing.session_duration().as_millis() as u64,
            "Joined chat room"
        );
    }

    fn on_message(&mut self, raw: &str) -> Result<()> {
        if !self.session.phase().is_connected() {
            trace!(session = %self.session.id, "Frame outside an open session ignored");
            return Ok(());
        }

        match decode(raw) {
            Ok(message) => {
                self.report.messages_received += 1;
                let latency = message.latency_at(Utc::now());
                metrics::record_received(latency.map(|d| d.as_secs_f64()));
                debug!(
                    session = %self.session.id,
                    from = message.nickname.as_deref().unwrap_or("-"),
                    text = message.text.as_deref().unwrap_or("-"),
                    "Message received"
                );
                Ok(())
            }
            Err(e) => {
                self.report.decode_failures += 1;
                metrics::record_decode_failure();
                Err(e)
            }
        }
    }

    fn on_timer(&mut self, kind: TimerKind) -> Result<()> {
        if !self.timers.accepts(kind) {
            trace!(session = %self.session.id, timer = %kind, "Firing of cancelled timer dropped");
            return Ok(());
        }

        match kind {
            TimerKind::Message => self.on_message_tick(),
            TimerKind::Leave => {
                self.on_leave();
                Ok(())
            }
            TimerKind::Disconnect => self.on_disconnect(),
        }
    }

    fn on_message_tick(&mut self) -> Result<()> {
        if self.session.phase() != SessionPhase::Active {
            return Ok(());
        }
        if let Some(active_at) = self.report.active_at {
            // Tick racing with the leave timer at the same instant
            if Instant::now() >= active_at + self.timing.leave_delay() {
                trace!(session = %self.session.id, "Tick at leave deadline dropped");
                return Ok(());
            }
        }
        let Some(nickname) = self.session.nickname().cloned() else {
            return Ok(());
        };

        let length = self.random.int_between(
            self.payload.text_length_min as u64,
            self.payload.text_length_max as u64,
        ) as usize;
        let text = self.random.string(length);

        self.send(&ChatAction::SendMessage, &nickname, Some(&text))?;
        self.report.messages_sent += 1;
        Ok(())
    }

    fn on_leave(&mut self) {
        if self.session.phase() != SessionPhase::Active {
            return;
        }

        self.timers.cancel(TimerKind::Message);
        self.session.transition(SessionPhase::Leaving);
        self.report.left_at = Some(Instant::now());

        info!(
            session = %self.session.id,
            duration_ms = self.timing.session_duration().as_millis() as u64,
            sent = self.report.messages_sent,
            "Session duration elapsed, leaving chat"
        );
    }

    fn on_disconnect(&mut self) -> Result<()> {
        if self.session.phase() == SessionPhase::Active {
            self.on_leave();
        }
        if self.session.phase() != SessionPhase::Leaving {
            return Ok(());
        }

        self.session.transition(SessionPhase::Disconnecting);
        self.report.disconnect_at = Some(Instant::now());
        info!(
            session = %self.session.id,
            grace_ms = self.timing.grace_period().as_millis() as u64,
            "Grace period over, disconnecting"
        );

        match &self.connection {
            Some(connection) => connection.close(),
            None => Ok(()),
        }
    }

    fn on_close(&mut self) {
        if self.cleaned_up {
            trace!(session = %self.session.id, "Duplicate close event ignored");
            return;
        }
        self.cleaned_up = true;

        let pending = self.timers.cancel_all();
        if self.connection.take().is_some() {
            metrics::connection_closed();
        }
        self.report.closed_at = Some(Instant::now());

        if self.session.phase() != SessionPhase::Errored {
            self.session.transition(SessionPhase::Closed);
            metrics::record_session(SessionOutcome::Closed);
        }

        debug!(
            session = %self.session.id,
            pending_timers = pending,
            received = self.report.messages_received,
            "Connection closed"
        );
    }

    fn on_error(&mut self, reason: &str) {
        match self.session.phase() {
            SessionPhase::Connecting | SessionPhase::Authenticating | SessionPhase::Active => {
                error!(session = %self.session.id, phase = %self.session.phase(), reason, "Connection error");
                self.session.transition(SessionPhase::Errored);
                self.timers.cancel_all();
                metrics::record_session(SessionOutcome::Errored);
            }
            SessionPhase::Leaving | SessionPhase::Disconnecting => {
                warn!(session = %self.session.id, reason, "Connection error while leaving");
            }
            SessionPhase::Closed | SessionPhase::Errored => {
                trace!(session = %self.session.id, reason, "Error after session end ignored");
            }
        }
    }

    fn send(&self, action: &ChatAction, nickname: &Nickname, text: Option<&str>) -> Result<()> {
        let connection = self.connection.as_ref().ok_or(LoadError::ConnectionClosed)?;
        let frame = self.codec.encode(action, nickname, text)?;
        connection.send_text(frame)?;
        metrics::record_sent(action.as_str());
        Ok(())
    }
}

/// Everything a session needs besides its id and timing, shared by all
/// sessions of a run.
#[derive(Clone)]
pub struct SessionSetup {
    pub url: Arc<Url>,
    pub codec: MessageCodec,
    pub payload: PayloadBounds,
    pub connector: Arc<dyn Connector>,
    pub random: Arc<dyn RandomSource>,
}

/// Run one session to completion on the current runtime.
pub async fn run_session(
    id: SessionId,
    setup: SessionSetup,
    timing: SessionTiming,
) -> SessionReport {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let scheduler = Arc::new(TokioScheduler::new(events_tx.clone()));
    let mut controller = SessionController::new(
        id,
        setup.codec.clone(),
        timing,
        setup.payload,
        scheduler,
        setup.random.clone(),
    );

    metrics::record_session(SessionOutcome::Started);
    debug!(session = %id, url = %setup.url, "Connecting");

    let first = match setup.connector.connect(&setup.url, events_tx).await {
        Ok(connection) => SessionEvent::Opened(connection),
        Err(e) => SessionEvent::Error(e.to_string()),
    };
    dispatch(&mut controller, first);

    while !controller.is_finished() {
        match events_rx.recv().await {
            Some(event) => dispatch(&mut controller, event),
            None => break,
        }
    }

    controller.report()
}

fn dispatch(controller: &mut SessionController, event: SessionEvent) {
    if let Err(e) = controller.handle(event) {
        let id = controller.session.id;
        if e.is_transport() {
            debug!(session = %id, error = %e, "Write to closed connection");
        } else {
            warn!(session = %id, error = %e, "Event handling failed");
        }
    }
}
