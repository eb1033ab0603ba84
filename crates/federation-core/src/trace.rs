//! Trace-context propagation.
//!
//! A trace id follows one logical unit of work across services: it is read
//! from the inbound HTTP request, stamped on every outbox message written in
//! that request, carried as a bus attribute, and restored by the consuming
//! listener. Nothing here is global; the context is passed explicitly.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Message/header attribute carrying the trace id.
pub const TRACING_ID_KEY: &str = "x-tracing-id";
/// Message attribute carrying the consumer-side dedupe key.
pub const IDEMPOTENT_KEY: &str = "x-idempotency-key";
/// HTTP header carrying the per-request id.
pub const REQUEST_ID_KEY: &str = "x-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceContext {
    trace_id: Uuid,
}

impl TraceContext {
    /// Start a fresh unit of work.
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
        }
    }

    pub fn from_trace_id(trace_id: Uuid) -> Self {
        Self { trace_id }
    }

    /// Restore a context from a propagated attribute value.
    ///
    /// Missing or malformed values start a fresh trace rather than failing
    /// the unit of work.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim).map(Uuid::parse_str) {
            Some(Ok(trace_id)) => Self { trace_id },
            Some(Err(_)) => {
                let ctx = Self::new();
                ::tracing::warn!(
                    trace_id = %ctx.trace_id,
                    "malformed trace id attribute, starting a new trace"
                );
                ctx
            }
            None => Self::new(),
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Span scoping one unit of work. Every log line inside carries `trace_id`.
    pub fn span(&self, operation: &'static str) -> ::tracing::Span {
        ::tracing::info_span!("unit_of_work", operation, trace_id = %self.trace_id)
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads `x-tracing-id`, then `x-request-id`, from the request headers.
///
/// Never rejects: requests without a usable id get a fresh trace.
impl<S: Send + Sync> FromRequestParts<S> for TraceContext {
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let raw = header(TRACING_ID_KEY).or_else(|| header(REQUEST_ID_KEY));
        let ctx = TraceContext::from_attribute(raw.as_deref());
        async move { Ok(ctx) }
    }
}
