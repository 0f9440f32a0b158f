//! W3C Trace Context propagation for calls to upstream HTTP APIs.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Write the current span's context as `traceparent`/`tracestate`.
/// Leaves `headers` untouched when no sampled OpenTelemetry span is active.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let context = Span::current().context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if !span_context.is_valid() {
        return;
    }

    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let tracestate = span_context.trace_state().header();
    if !tracestate.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&tracestate) {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }
}

/// Adds trace propagation headers to an outgoing reqwest request.
pub trait PropagateTraceExt {
    /// Attach the current trace context and, when known, the inbound
    /// request id.
    fn propagate_trace(self, request_id: Option<&str>) -> Self;
}

impl PropagateTraceExt for reqwest::RequestBuilder {
    fn propagate_trace(self, request_id: Option<&str>) -> Self {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);

        if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            headers.insert(REQUEST_ID_HEADER, value);
        }

        self.headers(headers)
    }
}
