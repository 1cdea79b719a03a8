/*!
 * Structured Tracing
 * Subscriber setup and spans for kernel event dispatch
 *
 * Features:
 * - Trace ID per dispatched event for correlation
 * - JSON-formatted logs for structured parsing
 * - `log` records from the subsystems bridged into the same subscriber
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Dispatch time above which an event is reported as slow
const SLOW_EVENT_MILLIS: u128 = 10;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - KERNEL_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("KERNEL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
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
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    match result {
        Ok(()) => info!(json = use_json, "Structured tracing initialized"),
        Err(e) => debug!(error = %e, "Tracing already initialized"),
    }
}

/// Generate a unique trace ID for event correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering the dispatch of one kernel event
pub struct EventSpan {
    span: tracing::Span,
    start: Instant,
    event: &'static str,
    trace_id: String,
}

impl EventSpan {
    pub fn new(event: &'static str) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "kernel_event",
            trace_id = %trace_id,
            event = event,
            pid = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            event,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_pid(&self, pid: u32) {
        self.span.record("pid", pid);
    }

    /// Record the outcome of the dispatched operation
    pub fn record_outcome<T, E: std::fmt::Display>(&self, outcome: &Result<T, E>) {
        match outcome {
            Ok(_) => {
                self.span.record("result", "success");
            }
            Err(e) => {
                self.span.record("result", "error");
                self.span.record("error", tracing::field::display(e));
            }
        }
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for EventSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration.as_millis() > SLOW_EVENT_MILLIS {
            warn!(
                trace_id = %self.trace_id,
                event = self.event,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow kernel event"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                event = self.event,
                duration_us = duration.as_micros() as u64,
                "kernel event handled"
            );
        }
    }
}

/// Helper to create an event span
#[inline]
pub fn span_event(event: &'static str) -> EventSpan {
    EventSpan::new(event)
}
