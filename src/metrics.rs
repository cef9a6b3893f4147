use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Instant;

use crate::{ProxyError, Result};

lazy_static! {
    pub static ref PROXY_UP: IntGauge = register_int_gauge!(
        "promql_proxy_up",
        "Whether the proxy is serving (1) or not (0)"
    ).expect("register promql_proxy_up");

    // Request metrics
    pub static ref REQUEST_COUNTER: IntCounter = register_int_counter!(
        "promql_proxy_requests_total",
        "Total number of query_range requests received"
    ).expect("register promql_proxy_requests_total");

    pub static ref REQUEST_DURATION: Histogram = register_histogram!(
        "promql_proxy_request_duration_seconds",
        "query_range request duration in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]
    ).expect("register promql_proxy_request_duration_seconds");

    pub static ref ERROR_COUNTER: IntCounterVec = register_int_counter_vec!(
        "promql_proxy_errors_total",
        "Total number of failed query_range requests by kind",
        &["kind"]
    ).expect("register promql_proxy_errors_total");

    pub static ref SERIES_RETURNED: IntCounter = register_int_counter!(
        "promql_proxy_series_returned_total",
        "Total number of series returned to callers"
    ).expect("register promql_proxy_series_returned_total");

    // Wavefront metrics
    pub static ref UPSTREAM_DURATION: Histogram = register_histogram!(
        "promql_proxy_upstream_duration_seconds",
        "Wavefront chart API round trip time in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]
    ).expect("register promql_proxy_upstream_duration_seconds");
}

pub fn init_metrics() {
    PROXY_UP.set(1);
}

/// Counts a request and observes its duration when dropped.
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn new() -> Self {
        REQUEST_COUNTER.inc();
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for RequestTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        REQUEST_DURATION.observe(duration);
    }
}

pub fn record_error(kind: &str) {
    ERROR_COUNTER.with_label_values(&[kind]).inc();
}

pub fn record_series_returned(count: usize) {
    SERIES_RETURNED.inc_by(count as u64);
}

pub fn record_upstream_duration(duration: f64) {
    UPSTREAM_DURATION.observe(duration);
}

/// Renders every registered metric in the Prometheus text format.
pub fn render() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| ProxyError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| ProxyError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timer_counts_and_observes() {
        let requests = REQUEST_COUNTER.get();
        let observed = REQUEST_DURATION.get_sample_count();
        {
            let _timer = RequestTimer::new();
        }
        assert!(REQUEST_COUNTER.get() > requests);
        assert!(REQUEST_DURATION.get_sample_count() > observed);
    }

    #[test]
    fn test_render_includes_error_counter() {
        record_error("transport");
        let text = render().unwrap();
        assert!(text.contains("promql_proxy_errors_total{kind=\"transport\"}"));
    }
}
