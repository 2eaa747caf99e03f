//! Prometheus metrics for the Stockroom web server.
//!
//! Request latency and counts are labelled by route template. Inventory
//! counters track stored changes, refused category deletes, and forms
//! rejected by validation.

use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// HTTP request duration histogram.
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";

/// HTTP request counter.
pub const HTTP_REQUEST_TOTAL: &str = "http_request_total";

/// Stored create/update/delete counter.
pub const INVENTORY_MUTATIONS: &str = "inventory_mutations_total";

/// Category deletes refused because items still reference the category.
pub const DELETE_BLOCKED: &str = "category_delete_blocked_total";

/// Form submissions rejected by validation.
pub const VALIDATION_REJECTED: &str = "form_validation_rejected_total";

const UNMATCHED_ENDPOINT: &str = "unmatched";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

static PROMETHEUS: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder once and returns its handle.
///
/// # Panics
///
/// Panics if another global recorder is already installed.
#[allow(clippy::panic)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .unwrap_or_else(|e| panic!("failed to install prometheus recorder: {e}"));
            describe();
            tracing::info!("Prometheus metrics recorder initialized");
            handle
        })
        .clone()
}

fn describe() {
    describe_histogram!(HTTP_REQUEST_DURATION, "Duration of HTTP requests in seconds");
    describe_counter!(HTTP_REQUEST_TOTAL, "Total number of HTTP requests");
    describe_counter!(INVENTORY_MUTATIONS, "Stored category and item changes");
    describe_counter!(DELETE_BLOCKED, "Category deletes refused due to dependent items");
    describe_counter!(VALIDATION_REJECTED, "Form submissions rejected by validation");
}

pub(crate) fn endpoint_label<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ENDPOINT, MatchedPath::as_str)
        .to_string()
}

/// Records `http_request_duration_seconds` and `http_request_total`, labelled
/// by `endpoint`, `method`, and `status_class`.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = endpoint_label(&request);
    let method = request.method().to_string();

    let response = next.run(request).await;

    let labels = [
        ("endpoint", endpoint),
        ("method", method),
        ("status_class", status_class(response.status()).to_string()),
    ];
    histogram!(HTTP_REQUEST_DURATION, &labels).record(start.elapsed().as_secs_f64());
    counter!(HTTP_REQUEST_TOTAL, &labels).increment(1);

    response
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        5 => "5xx",
        _ => "unknown",
    }
}

/// `GET /metrics`: Prometheus text, or 503 before [`init_metrics`] ran.
pub async fn serve_metrics() -> Response {
    match PROMETHEUS.get() {
        Some(handle) => ([(CONTENT_TYPE, TEXT_PLAIN)], handle.render()).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(CONTENT_TYPE, TEXT_PLAIN)],
            "Metrics not initialized",
        )
            .into_response(),
    }
}

/// Records a stored change (`entity` is `category` or `item`).
pub fn record_mutation(entity: &'static str, action: &'static str) {
    counter!(INVENTORY_MUTATIONS, "entity" => entity, "action" => action).increment(1);
}

/// Records a refused category delete.
pub fn record_delete_blocked() {
    counter!(DELETE_BLOCKED).increment(1);
}

/// Records a form submission rejected by validation.
pub fn record_validation_rejected(entity: &'static str) {
    counter!(VALIDATION_REJECTED, "entity" => entity).increment(1);
}
