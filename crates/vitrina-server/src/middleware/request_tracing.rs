use crate::http::handlers::{make_request_id, propagated_request_id, with_request_id};
use crate::AppState;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Request id assigned (or propagated) at the edge, available to every
/// handler through request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub async fn request_tracing_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(req.headers())
        .unwrap_or_else(|| make_request_id(&state.request_id_seed));
    let method = req.method().clone();
    // The matched route template keeps metrics cardinality bounded; fall back
    // to the raw path for requests that never matched a route.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = info_span!("request", %method, route = %route, request_id = %request_id);
    let resp = next.run(req).instrument(span).await;

    let status = resp.status().as_u16();
    let elapsed = started.elapsed();
    state.metrics.observe_request(&route, status, elapsed);
    info!(
        %method,
        route = %route,
        status,
        elapsed_ms = elapsed.as_millis() as u64,
        request_id = %request_id,
        "request complete"
    );
    with_request_id(resp, &request_id)
}
