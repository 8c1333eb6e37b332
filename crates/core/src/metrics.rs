//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Transcode jobs (starts, stops, pre-cuts, subtitle extraction)
//! - Remote dispatch (liveness probes, wake signals, outcomes)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Transcode Jobs
// =============================================================================

/// Transcode starts by result.
pub static TRANSCODES_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediactl_transcodes_started_total", "Total transcode starts"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Engine processes currently tracked as running.
pub static TRANSCODES_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediactl_transcodes_running",
        "Engine processes launched and not yet reaped",
    )
    .unwrap()
});

/// Transcode stops.
pub static TRANSCODES_STOPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mediactl_transcodes_stopped_total", "Total transcode stops").unwrap()
});

/// Pre-cut duration in seconds.
pub static PRE_CUT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediactl_pre_cut_duration_seconds",
            "Duration of the stream-copy cut before burn-in transcodes",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .unwrap()
});

/// Subtitle extractions by outcome.
pub static SUBTITLE_EXTRACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediactl_subtitle_extractions_total",
            "Total subtitle extraction requests",
        ),
        &["outcome"], // "webvtt", "unsupported", "not_requested", "failed"
    )
    .unwrap()
});

// =============================================================================
// Remote Dispatch
// =============================================================================

/// Liveness probes against the remote host by result.
pub static REMOTE_PROBES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediactl_remote_probes_total",
            "Total liveness probes sent to the remote transcode host",
        ),
        &["result"], // "alive", "unreachable"
    )
    .unwrap()
});

/// Wake signals sent.
pub static WAKE_SIGNALS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediactl_wake_signals_total", "Total wake-on-LAN packets sent"),
        &["result"], // "sent", "failed"
    )
    .unwrap()
});

/// Dispatch outcomes.
pub static DISPATCH_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediactl_dispatch_outcomes_total", "Total dispatch requests"),
        &["outcome"], // "local", "accepted", "unavailable"
    )
    .unwrap()
});

/// Time spent dispatching, including wake-up waits.
pub static DISPATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediactl_dispatch_duration_seconds",
            "Duration of remote dispatch including retries",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Transcode jobs
        Box::new(TRANSCODES_STARTED.clone()),
        Box::new(TRANSCODES_RUNNING.clone()),
        Box::new(TRANSCODES_STOPPED.clone()),
        Box::new(PRE_CUT_DURATION.clone()),
        Box::new(SUBTITLE_EXTRACTIONS.clone()),
        // Remote dispatch
        Box::new(REMOTE_PROBES.clone()),
        Box::new(WAKE_SIGNALS.clone()),
        Box::new(DISPATCH_OUTCOMES.clone()),
        Box::new(DISPATCH_DURATION.clone()),
    ]
}
