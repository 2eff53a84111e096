/*!
 * Tracing
 * Structured logging for guarded runs using the tracing crate
 *
 * Features:
 * - Run ID generation for correlating supervisor, teardown and worker logs
 * - JSON-formatted logs for structured parsing
 * - Phase spans timing snapshot and teardown work
 * - `log` records from the resource layer forwarded into the same subscriber
 */

use std::time::Instant;
use tracing::{debug, span, warn, Level, Span};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Set to `1` or `true` for JSON output
pub const ENV_TRACE_JSON: &str = "DEADLINE_GUARD_TRACE_JSON";

// Phases slower than this are reported at warn level
const SLOW_PHASE_MS: u128 = 500;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - DEADLINE_GUARD_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling this more than once is harmless; only the first call installs a
/// subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!(json = use_json, "tracing initialized");
    }
}

/// Unique ID for one guarded run
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Times one phase of a run (snapshot, teardown) and logs its duration on drop
pub struct PhaseSpan {
    span: Span,
    start: Instant,
    phase: &'static str,
}

impl PhaseSpan {
    pub fn new(phase: &'static str) -> Self {
        let span = span!(
            Level::DEBUG,
            "phase",
            phase = phase,
            duration_ms = tracing::field::Empty,
            items = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            phase,
        }
    }

    /// Record how many resources the phase handled
    pub fn record_items(&self, count: usize) {
        self.span.record("items", count);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for PhaseSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_ms", duration.as_millis() as u64);

        if duration.as_millis() > SLOW_PHASE_MS {
            warn!(
                phase = self.phase,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow phase"
            );
        } else {
            debug!(
                phase = self.phase,
                duration_us = duration.as_micros() as u64,
                "phase completed"
            );
        }
    }
}

/// Helper to create a phase span
#[inline]
pub fn span_phase(phase: &'static str) -> PhaseSpan {
    PhaseSpan::new(phase)
}
