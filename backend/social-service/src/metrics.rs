//! Prometheus metrics for social-service.
//!
//! Exposes relationship toggle collectors and an HTTP handler for the `/metrics` endpoint.
//! Request latency is recorded by `actix_middleware::MetricsMiddleware`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Toggle results segmented by relation (follows/likes) and outcome (created/removed/conflict).
    pub static ref TOGGLE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "social_toggle_total",
        "Relationship toggles segmented by relation and outcome",
        &["relation", "outcome"]
    )
    .expect("failed to register social_toggle_total");

    /// Toggle attempts that lost a race and were re-run.
    pub static ref TOGGLE_RETRY_TOTAL: IntCounterVec = register_int_counter_vec!(
        "social_toggle_retry_total",
        "Toggle attempts re-run after a concurrent change to the same edge",
        &["relation"]
    )
    .expect("failed to register social_toggle_retry_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
