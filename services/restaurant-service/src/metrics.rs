use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

const SERVICE: &str = "restaurant-service";

pub static SERVICE_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new("http_errors_total", "Count of HTTP error responses emitted (status >= 400)"),
        &["service", "code", "status"],
    )
    .expect("http_errors_total definition");
    SERVICE_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

static LOGIN_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new("auth_login_attempts_total", "Count of login attempts grouped by outcome"),
        &["outcome"],
    )
    .expect("auth_login_attempts_total definition");
    SERVICE_REGISTRY.register(Box::new(v.clone())).ok();
    v
});

static ORDERS_PLACED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new("orders_placed_total", "Orders accepted and persisted")
        .expect("orders_placed_total definition");
    SERVICE_REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub fn login_attempt(outcome: &str) {
    LOGIN_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn order_placed() {
    ORDERS_PLACED_TOTAL.inc();
}

/// Counts every error response by its `X-Error-Code` and status.
pub async fn http_error_metrics(req: Request<Body>, next: Next) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.as_u16() >= 400 {
        let code = resp
            .headers()
            .get("X-Error-Code")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        HTTP_ERRORS_TOTAL
            .with_label_values(&[SERVICE, code, status.as_str()])
            .inc();
    }
    resp
}

pub async fn metrics_endpoint() -> Response {
    // Touch the lazies so every family shows up before its first event.
    Lazy::force(&HTTP_ERRORS_TOTAL);
    Lazy::force(&LOGIN_ATTEMPTS_TOTAL);
    Lazy::force(&ORDERS_PLACED_TOTAL);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&SERVICE_REGISTRY.gather(), &mut buffer) {
        error!(error = %err, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"))],
        buffer,
    )
        .into_response()
}
