//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator jobs (results, worker duration)
//! - Media staging (files written, cleanup failures)
//! - Log relay events

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Jobs finished by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postflow_jobs_total", "Total automation jobs by result"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Job failures by cause.
pub static JOB_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postflow_job_failures_total", "Failed jobs by cause"),
        &["cause"], // "account", "staging", "spawn", "exit", "timeout"
    )
    .unwrap()
});

/// Worker process wall time in seconds.
pub static WORKER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "postflow_worker_duration_seconds",
            "Duration of worker processes",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Staging Metrics
// =============================================================================

/// Media files written to the staging directory.
pub static STAGED_FILES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postflow_staged_files_total", "Media files staged for jobs"),
        &["kind"],
    )
    .unwrap()
});

/// Staged files that could not be removed.
pub static CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "postflow_cleanup_failures_total",
        "Staged files that could not be removed",
    )
    .unwrap()
});

// =============================================================================
// Relay Metrics
// =============================================================================

/// Worker log lines relayed, by level.
pub static LOG_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("postflow_log_events_total", "Log events relayed by level"),
        &["level"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_FAILURES.clone()),
        Box::new(WORKER_DURATION.clone()),
        Box::new(STAGED_FILES.clone()),
        Box::new(CLEANUP_FAILURES.clone()),
        Box::new(LOG_EVENTS.clone()),
    ]
}
