//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mock_requests_total` (counter): requests by method, status, outcome
//! - `mock_request_duration_seconds` (histogram): handling latency by outcome
//! - `mock_reloads_total` (counter): reload attempts by result
//! - `mock_active_routes` (gauge): mapped routes in the current table
//!
//! Outcomes are `matched`, `unmatched` and `admin`. Methods outside the
//! standard set are labelled `OTHER` to keep series bounded.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    ::metrics::counter!(
        "mock_requests_total",
        "method" => method_label(method),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!("mock_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    ::metrics::counter!("mock_reloads_total", "result" => result).increment(1);
}

pub fn set_active_routes(routes: usize) {
    ::metrics::gauge!("mock_active_routes").set(routes as f64);
}

/// Standard methods keep their name; extension methods collapse to `OTHER`.
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "CONNECT" => "CONNECT",
        "OPTIONS" => "OPTIONS",
        "TRACE" => "TRACE",
        "PATCH" => "PATCH",
        _ => "OTHER",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_methods_keep_their_label() {
        for method in ["GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH"] {
            assert_eq!(method_label(method), method);
        }
    }

    #[test]
    fn test_extension_methods_share_one_label() {
        assert_eq!(method_label("PURGE"), "OTHER");
        assert_eq!(method_label("X-RANDOM-1234"), "OTHER");
        assert_eq!(method_label("get"), "OTHER");
    }
}
