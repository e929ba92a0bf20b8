/*!
 * Cycle Tracing
 * Structured tracing for kernel cycles using the tracing crate
 *
 * Features:
 * - Trace ID per cycle for log correlation
 * - JSON-formatted logs for structured parsing
 * - Budget overrun warnings with the offending cycle's numbers
 */

use crate::core::types::{Cost, Cycle};
use crate::scheduler::CycleReport;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Selects the JSON layer when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "KERNEL_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - KERNEL_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls leave the first subscriber in place.
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
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
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
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "structured tracing initialized");
    }
}

/// Generate a unique trace ID for cycle correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one kernel cycle
///
/// Every event logged while the span is entered carries its `trace_id` and
/// `cycle`. Dropping it logs the cycle duration.
pub struct CycleSpan {
    span: Span,
    start: Instant,
    cycle: Cycle,
    trace_id: String,
}

impl CycleSpan {
    pub fn new(cycle: Cycle, budget: Cost) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::INFO,
            "cycle",
            trace_id = %trace_id,
            cycle,
            budget,
            spent = tracing::field::Empty,
            invoked = tracing::field::Empty,
            suspended = tracing::field::Empty,
            crashed = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            cycle,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Attach a pass outcome to the span
    pub fn record_report(&self, report: &CycleReport) {
        self.span.record("spent", report.spent);
        self.span.record("invoked", report.invoked.len());
        self.span.record("suspended", report.suspended.len());
        self.span.record("crashed", report.crashed.len());

        let _entered = self.span.enter();
        if report.over_budget() {
            warn!(
                trace_id = %self.trace_id,
                cycle = report.cycle,
                budget = report.budget,
                spent = report.spent,
                overrun = report.spent - report.budget,
                "cycle exceeded its budget"
            );
        } else {
            info!(
                cycle = report.cycle,
                spent = report.spent,
                budget = report.budget,
                invoked = report.invoked.len(),
                suspended = report.suspended.len(),
                crashed = report.crashed.len(),
                "cycle complete"
            );
        }
    }
}

impl Drop for CycleSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();
        debug!(
            trace_id = %self.trace_id,
            cycle = self.cycle,
            duration_us = duration.as_micros() as u64,
            "cycle span closed"
        );
    }
}

/// Get the current span for manual tracing
pub fn current_span() -> Span {
    Span::current()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids_are_unique_uuids() {
        let a = generate_trace_id();
        let b = generate_trace_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_cycle_span_records_report() {
        let span = CycleSpan::new(4, 100);
        let mut report = CycleReport::new(4, 100);
        report.spent = 150;
        report.invoked = vec![1, 2];
        span.record_report(&report);
        assert_eq!(span.trace_id().len(), 36);
    }
}
