use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use vitrina_api::ApiError;

use crate::config::CONFIG_SCHEMA_VERSION;

const REQUEST_ID_HEADER: &str = "x-request-id";
const REQUEST_ID_MAX_LEN: usize = 64;

/// Error envelope response. All non-2xx bodies on API routes go through here
/// so every failure carries a code, a message, and the request id.
pub(crate) fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    let mut resp = (status, axum::Json(json!({ "error": err }))).into_response();
    resp.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp
}

pub(crate) fn error_json(status: StatusCode, err: ApiError, request_id: &str) -> Response {
    api_error_response(status, err.with_request_id(request_id))
}

/// Accepts a caller-supplied request id when it looks sane, otherwise mints
/// a fresh one. Keeps upstream proxies' ids flowing through the logs.
pub(crate) fn propagated_request_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?;
    if raw.is_empty() || raw.len() > REQUEST_ID_MAX_LEN {
        return None;
    }
    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some(raw.to_string())
}

pub(crate) fn make_request_id(seed: &AtomicU64) -> String {
    let n = seed.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(n.to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    let digest = hasher.finalize();
    let short: String = digest[..6].iter().map(|b| format!("{b:02x}")).collect();
    format!("req-{short}")
}

pub(crate) fn with_request_id(mut resp: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

pub(crate) fn content_etag(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    let digest = hasher.finalize();
    let short: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();
    format!("\"{short}\"")
}

pub(crate) fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|raw| raw.split(',').any(|c| c.trim() == etag || c.trim() == "*"))
        .unwrap_or(false)
}

pub(crate) fn put_cache_headers(resp: &mut Response, ttl: Duration, etag: &str) {
    let headers = resp.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs())) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, value);
    }
}

pub(crate) fn not_modified(etag: &str) -> Response {
    let mut resp = StatusCode::NOT_MODIFIED.into_response();
    if let Ok(value) = HeaderValue::from_str(etag) {
        resp.headers_mut().insert(header::ETAG, value);
    }
    resp
}

pub async fn healthz_handler(State(state): State<AppState>) -> Response {
    if state
        .accepting_requests
        .load(std::sync::atomic::Ordering::SeqCst)
    {
        (StatusCode::OK, axum::Json(json!({ "status": "ok" }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(json!({ "status": "draining" })),
        )
            .into_response()
    }
}

pub async fn readyz_handler(State(state): State<AppState>) -> Response {
    if state.ready.load(std::sync::atomic::Ordering::SeqCst) {
        (StatusCode::OK, axum::Json(json!({ "status": "ready" }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(json!({ "status": "starting", "reason": "backend probe pending" })),
        )
            .into_response()
    }
}

pub async fn version_handler(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        axum::Json(json!({
            "name": crate::CRATE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "config_schema": CONFIG_SCHEMA_VERSION,
            "backend": state.backend.backend_tag(),
        })),
    )
        .into_response()
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let body = state
        .metrics
        .render(state.resolver.hit_count(), state.resolver.miss_count());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
