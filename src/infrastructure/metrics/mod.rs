//! Prometheus Metrics Module
//!
//! Counters describing what the simulated clients did during a run.
//!
//! # Metrics Collected
//! - Sessions by outcome (started, closed, errored)
//! - Currently connected sessions
//! - Outbound messages by action, inbound messages, decode failures
//! - Broadcast latency from the sender's `send_at` to local receipt

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "chat_load";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Session counter by outcome
pub static SESSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("sessions_total", "Simulated sessions by outcome").namespace(NAMESPACE),
        &["outcome"], // "started", "closed", "errored"
    )
    .expect("Failed to create SESSIONS_TOTAL metric")
});

/// Sessions with an open connection
pub static SESSIONS_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("sessions_connected", "Sessions with an open connection").namespace(NAMESPACE),
    )
    .expect("Failed to create SESSIONS_CONNECTED metric")
});

/// Outbound messages by action
pub static MESSAGES_SENT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("messages_sent_total", "Messages sent by simulated clients").namespace(NAMESPACE),
        &["action"],
    )
    .expect("Failed to create MESSAGES_SENT_TOTAL metric")
});

/// Inbound broadcasts
pub static MESSAGES_RECEIVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("messages_received_total", "Broadcasts received by simulated clients")
            .namespace(NAMESPACE),
    )
    .expect("Failed to create MESSAGES_RECEIVED_TOTAL metric")
});

/// Inbound frames that failed to decode
pub static DECODE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("decode_failures_total", "Inbound frames that failed to decode")
            .namespace(NAMESPACE),
    )
    .expect("Failed to create DECODE_FAILURES_TOTAL metric")
});

/// Sender-to-receiver latency histogram
pub static BROADCAST_LATENCY_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let buckets = vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    Histogram::with_opts(
        HistogramOpts::new(
            "broadcast_latency_seconds",
            "Time from a message's send_at to its receipt by another client",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
    )
    .expect("Failed to create BROADCAST_LATENCY_SECONDS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(SESSIONS_TOTAL.clone()))
        .expect("Failed to register SESSIONS_TOTAL");
    registry
        .register(Box::new(SESSIONS_CONNECTED.clone()))
        .expect("Failed to register SESSIONS_CONNECTED");
    registry
        .register(Box::new(MESSAGES_SENT_TOTAL.clone()))
        .expect("Failed to register MESSAGES_SENT_TOTAL");
    registry
        .register(Box::new(MESSAGES_RECEIVED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_RECEIVED_TOTAL");
    registry
        .register(Box::new(DECODE_FAILURES_TOTAL.clone()))
        .expect("Failed to register DECODE_FAILURES_TOTAL");
    registry
        .register(Box::new(BROADCAST_LATENCY_SECONDS.clone()))
        .expect("Failed to register BROADCAST_LATENCY_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Session lifecycle outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Started,
    Closed,
    Errored,
}

impl SessionOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }
}

/// Helper to record a session lifecycle outcome
pub fn record_session(outcome: SessionOutcome) {
    SESSIONS_TOTAL.with_label_values(&[outcome.label()]).inc();
}

/// Helper to track open connections
pub fn connection_opened() {
    SESSIONS_CONNECTED.inc();
}

pub fn connection_closed() {
    SESSIONS_CONNECTED.dec();
}

/// Helper to record an outbound message
pub fn record_sent(action: &str) {
    MESSAGES_SENT_TOTAL.with_label_values(&[action]).inc();
}

/// Helper to record a decoded broadcast and its latency when known
pub fn record_received(latency_secs: Option<f64>) {
    MESSAGES_RECEIVED_TOTAL.inc();
    if let Some(latency) = latency_secs {
        BROADCAST_LATENCY_SECONDS.observe(latency);
    }
}

pub fn record_decode_failure() {
    DECODE_FAILURES_TOTAL.inc();
}

/// Totals for the end-of-run summary log line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunTotals {
    pub sessions_started: u64,
    pub sessions_closed: u64,
    pub sessions_errored: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub decode_failures: u64,
}

/// Snapshot the counters.
pub fn run_totals() -> RunTotals {
    let sent = ["PUT_NICKNAME", "SEND_MESSAGE"]
        .iter()
        .map(|action| MESSAGES_SENT_TOTAL.with_label_values(&[*action]).get())
        .sum();

    RunTotals {
        sessions_started: SESSIONS_TOTAL.with_label_values(&["started"]).get(),
        sessions_closed: SESSIONS_TOTAL.with_label_values(&["closed"]).get(),
        sessions_errored: SESSIONS_TOTAL.with_label_values(&["errored"]).get(),
        messages_sent: sent,
        messages_received: MESSAGES_RECEIVED_TOTAL.get(),
        decode_failures: DECODE_FAILURES_TOTAL.get(),
    }
}
