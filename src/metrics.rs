//! HTTP request metrics exported in Prometheus text format.
//!
//! Records `http_requests_total{method, path, status}` and
//! `http_request_duration_seconds{method, path}` from an axum middleware.
//! The registry is created by the composition root and carried in
//! [`AppState`](crate::state::AppState); the account core never sees it.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::state::AppState;

/// Path label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests: IntCounterVec,
    duration: HistogramVec,
}

impl HttpMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path"],
        )?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            duration,
        })
    }

    pub fn record(&self, method: &str, path: &str, status: u16, seconds: f64) {
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.duration.with_label_values(&[method, path]).observe(seconds);
    }

    pub fn request_count(&self, method: &str, path: &str, status: u16) -> u64 {
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, path, status.as_str()])
            .get()
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Labels requests by their route template so arbitrary URLs cannot create
/// new series.
pub async fn track_http(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());
    let start = Instant::now();
    let response = next.run(request).await;
    state.metrics.record(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_counts_and_durations() {
        let m = HttpMetrics::new().expect("metrics");
        m.record("POST", "/api/v1/auth/login", 200, 0.02);
        m.record("POST", "/api/v1/auth/login", 200, 0.2);
        m.record("POST", "/api/v1/auth/login", 401, 0.01);

        assert_eq!(m.request_count("POST", "/api/v1/auth/login", 200), 2);
        assert_eq!(m.request_count("POST", "/api/v1/auth/login", 401), 1);

        let text = m.render().expect("render");
        assert!(text.contains(
            r#"http_requests_total{method="POST",path="/api/v1/auth/login",status="200"} 2"#
        ));
        assert!(text.contains(
            r#"http_request_duration_seconds_count{method="POST",path="/api/v1/auth/login"} 3"#
        ));
    }
}
