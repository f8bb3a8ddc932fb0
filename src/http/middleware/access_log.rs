//! Access logging.
//! One structured line per request, optionally including the response body.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::RequestIdExt;

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLog {
    /// Buffer responses and include their bodies in the log line.
    pub log_bodies: bool,
}

pub async fn access_log_middleware(
    State(config): State<AccessLog>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();

    tracing::debug!(request_id = %request_id, method = %method, uri = %uri, "Request received");

    let response = next.run(request).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    if !config.log_bodies {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            latency_ms,
            "Response sent"
        );
        return response;
    }

    let (parts, body) = response.into_parts();
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                uri = %uri,
                status = status.as_u16(),
                latency_ms,
                body = %String::from_utf8_lossy(&bytes),
                "Response sent"
            );
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to buffer response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
