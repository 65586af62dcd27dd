//! Request logging middleware.
//!
//! Tags every request with a fresh id, logs method, path, status and
//! latency once the response is ready, and echoes the id back in
//! `X-Request-Id`. Bodies are never logged; they carry patient data.

use std::time::Instant;

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::api::types::REQUEST_ID_HEADER;

pub async fn log_request(req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let span = tracing::info_span!("request", id = %request_id, %method, %path);
    let mut response = next.run(req).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    span.in_scope(|| {
        if status >= 500 {
            tracing::warn!(status, latency_ms, "Request failed");
        } else {
            tracing::info!(status, latency_ms, "Request served");
        }
    });

    if let Ok(val) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    response
}
