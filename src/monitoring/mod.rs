/*!
 * Monitoring
 * Structured tracing setup and phase timing for guarded runs
 */

mod tracer;

pub use tracer::{generate_run_id, init_tracing, span_phase, PhaseSpan, ENV_TRACE_JSON};
