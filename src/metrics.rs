//! Prometheus metrics: HTTP middleware plus business counters.
//!
//! Everything is a no-op when `OBSERVABILITY_ENABLED` is `false` or `0`.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and spawns its upkeep task.
///
/// Returns `Ok(None)` when observability is disabled.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full("llm_generation_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    gauge!("http_requests_active").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_active").decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

/// Router served on the separate metrics port.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_login(success: bool, role: &str) {
    if !is_observability_enabled() {
        return;
    }
    let status = if success { "success" } else { "failure" };
    counter!("user_logins_total", "role" => role.to_string(), "status" => status).increment(1);
}

pub fn track_jwt_issued(token_type: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_tokens_issued_total", "type" => token_type).increment(1);
}

/// Outcome of an `X-API-KEY` check: `valid`, `invalid` or `missing`.
pub fn track_api_key_auth(outcome: &'static str, keys_scanned: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("api_key_auth_total", "outcome" => outcome).increment(1);
    histogram!("api_key_scan_size").record(keys_scanned as f64);
}

pub fn track_users_created(source: &'static str, count: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "source" => source).increment(count as u64);
}

pub fn track_enrollments_created(source: &'static str, count: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("enrollments_created_total", "source" => source).increment(count as u64);
}

pub fn track_assessment_submitted(category: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("assessments_submitted_total", "category" => category).increment(1);
}

pub fn track_llm_attempt(task: &'static str, accepted: bool, duration_secs: f64) {
    if !is_observability_enabled() {
        return;
    }
    let outcome = if accepted { "accepted" } else { "rejected" };
    counter!("llm_generation_attempts_total", "task" => task, "outcome" => outcome).increment(1);
    histogram!("llm_generation_duration_seconds", "task" => task).record(duration_secs);
}

/// Counts responses built from canned content after every prompt failed.
pub fn track_llm_fallback(task: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("llm_generation_fallbacks_total", "task" => task).increment(1);
}
