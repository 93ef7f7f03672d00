use crate::http::handlers::error_json;
use crate::middleware::request_tracing::RequestId;
use crate::middleware::tenant::SuperAdminScope;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde_json::json;
use tracing::info;
use vitrina_api::ApiError;
use vitrina_model::{parse_tenant_id, Agency, Plan};

fn request_id(id: Option<&Extension<RequestId>>) -> String {
    id.map(|ext| ext.0 .0.clone())
        .unwrap_or_else(|| "req-unknown".to_string())
}

fn missing_scope(request_id: &str) -> Response {
    error_json(
        StatusCode::NOT_FOUND,
        ApiError::not_found("route", "sadmin"),
        request_id,
    )
}

fn backend_error(e: &crate::BackendError, request_id: &str) -> Response {
    error_json(
        StatusCode::BAD_GATEWAY,
        ApiError::backend_unavailable(&e.to_string()),
        request_id,
    )
}

pub async fn list_agencies_handler(
    State(state): State<AppState>,
    scope: Option<Extension<SuperAdminScope>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    if scope.is_none() {
        return missing_scope(&request_id);
    }
    match state.backend.list_agencies().await {
        Ok(agencies) => (StatusCode::OK, axum::Json(json!({ "items": agencies }))).into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn create_agency_handler(
    State(state): State<AppState>,
    scope: Option<Extension<SuperAdminScope>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(agency): axum::Json<Agency>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    if scope.is_none() {
        return missing_scope(&request_id);
    }
    if let Err(e) = agency.validate() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::validation_failed(json!([{ "field": "agency", "reason": e.to_string() }])),
            &request_id,
        );
    }
    match state.backend.create_agency(&agency).await {
        Ok(created) => {
            info!(agency = %created.id, hostname = %created.hostname, "agency created");
            // A fresh agency may claim a hostname cached as unknown.
            state.resolver.invalidate(&created.hostname).await;
            (StatusCode::CREATED, axum::Json(created)).into_response()
        }
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn update_agency_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    scope: Option<Extension<SuperAdminScope>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(agency): axum::Json<Agency>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    if scope.is_none() {
        return missing_scope(&request_id);
    }
    let tenant_id = match parse_tenant_id(&id) {
        Ok(tenant_id) => tenant_id,
        Err(_) => return error_json(StatusCode::BAD_REQUEST, ApiError::invalid_param("id", &id), &request_id),
    };
    if let Err(e) = agency.validate() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::validation_failed(json!([{ "field": "agency", "reason": e.to_string() }])),
            &request_id,
        );
    }
    match state.backend.update_agency(&tenant_id, &agency).await {
        Ok(Some(updated)) => {
            info!(agency = %updated.id, "agency updated");
            // The update may have remapped hostnames or changed branding.
            state.resolver.invalidate_all().await;
            state.visual.invalidate(&tenant_id).await;
            (StatusCode::OK, axum::Json(updated)).into_response()
        }
        Ok(None) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("agency", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn list_plans_handler(
    State(state): State<AppState>,
    scope: Option<Extension<SuperAdminScope>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    if scope.is_none() {
        return missing_scope(&request_id);
    }
    match state.backend.list_plans().await {
        Ok(plans) => (StatusCode::OK, axum::Json(json!({ "items": plans }))).into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn update_plan_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    scope: Option<Extension<SuperAdminScope>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(plan): axum::Json<Plan>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    if scope.is_none() {
        return missing_scope(&request_id);
    }
    if plan.max_properties == 0 {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::validation_failed(
                json!([{ "field": "max_properties", "reason": "must be positive" }]),
            ),
            &request_id,
        );
    }
    match state.backend.update_plan(&id, &plan).await {
        Ok(Some(updated)) => {
            info!(plan = %updated.id, "plan updated");
            (StatusCode::OK, axum::Json(updated)).into_response()
        }
        Ok(None) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("plan", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}
