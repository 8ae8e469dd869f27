//! Request identification and tracing spans.
//!
//! # Responsibilities
//! - Assign `x-request-id` to requests that arrive without one
//! - Echo the id on the response
//! - Expose the id to handlers so it can travel to the next hop
//!
//! # Design Decisions
//! - An incoming id is kept, so one id names a whole traversal
//! - UUID v4 ids, generated as early as possible

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer assigning a UUID to requests without an id.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer copying the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// Request id carried in `headers`, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Span for one inbound request, tagged with stage and request id.
pub fn make_span(stage: &'static str) -> impl Fn(&Request<Body>) -> Span + Clone {
    move |request: &Request<Body>| {
        tracing::info_span!(
            "request",
            stage = stage,
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id(request.headers()),
        )
    }
}
