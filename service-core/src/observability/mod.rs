pub mod logging;
pub mod metrics;
pub mod trace_context;

pub use logging::init_tracing;
pub use self::metrics::init_metrics;
pub use trace_context::{inject_trace_context, PropagateTraceExt, REQUEST_ID_HEADER};
