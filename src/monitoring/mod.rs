/*!
 * Monitoring Module
 * Structured tracing for the kernel
 */

pub mod tracer;

pub use tracer::{generate_trace_id, init_tracing, span_event, EventSpan};
