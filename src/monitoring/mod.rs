/*!
 * Monitoring
 * Structured tracing and cumulative metrics for kernel cycles
 */

mod metrics;
mod tracer;

pub use metrics::{KernelMetrics, MetricsSnapshot};
pub use tracer::{current_span, generate_trace_id, init_tracing, CycleSpan, ENV_TRACE_JSON};
