use crate::http::handlers::error_json;
use crate::middleware::request_tracing::RequestId;
use crate::middleware::tenant::TenantContext;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;
use vitrina_api::params::{parse_listing_filter, parse_page_params, PageParams};
use vitrina_api::ApiError;
use vitrina_model::{
    validate_client, validate_enterprise, validate_property, validate_realtor, Client, Enterprise,
    Feature, Plan, Property, Realtor,
};

const PLAN_ROUTE: &str = "/admin/v1/plan";

fn request_id(id: Option<&Extension<RequestId>>) -> String {
    id.map(|ext| ext.0 .0.clone())
        .unwrap_or_else(|| "req-unknown".to_string())
}

fn missing_tenant(request_id: &str) -> Response {
    error_json(
        StatusCode::NOT_FOUND,
        ApiError::tenant_not_resolved("unresolved"),
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

fn feature_name(feature: Feature) -> &'static str {
    match feature {
        Feature::Enterprises => "enterprises",
        Feature::Clients => "clients",
        Feature::FeaturedListings => "featured_listings",
        Feature::CustomDomain => "custom_domain",
        _ => "unknown",
    }
}

/// The gate the route-level admin surfaces rely on: the feature must be in
/// the agency's plan or the request gets a 403 with an upgrade hint.
async fn require_feature(
    state: &AppState,
    ctx: &TenantContext,
    feature: Feature,
    request_id: &str,
) -> Result<Plan, Response> {
    let plan = state
        .backend
        .fetch_plan(&ctx.tenant.id)
        .await
        .map_err(|e| backend_error(&e, request_id))?;
    if plan.allows(feature) {
        Ok(plan)
    } else {
        Err(error_json(
            StatusCode::FORBIDDEN,
            ApiError::feature_not_in_plan(feature_name(feature), PLAN_ROUTE),
            request_id,
        ))
    }
}

pub async fn list_properties_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    let page = match parse_page_params(&query) {
        Ok(page) => page,
        Err(err) => return error_json(StatusCode::BAD_REQUEST, err, &request_id),
    };
    let filter = match parse_listing_filter(&query) {
        Ok(filter) => filter,
        Err(err) => return error_json(StatusCode::BAD_REQUEST, err, &request_id),
    };
    match state
        .backend
        .list_properties(&ctx.tenant.id, &filter, &page)
        .await
    {
        Ok(listing) => (
            StatusCode::OK,
            axum::Json(json!({ "items": listing.items, "total": listing.total })),
        )
            .into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn get_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    match state.backend.get_property(&ctx.tenant.id, &id).await {
        Ok(Some(property)) => (StatusCode::OK, axum::Json(property)).into_response(),
        Ok(None) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("property", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn create_property_handler(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(property): axum::Json<Property>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    let report = validate_property(&property);
    if !report.is_ok() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::from_validation_report(&report),
            &request_id,
        );
    }
    let plan = match state.backend.fetch_plan(&ctx.tenant.id).await {
        Ok(plan) => plan,
        Err(e) => return backend_error(&e, &request_id),
    };
    if property.featured && !plan.allows(Feature::FeaturedListings) {
        return error_json(
            StatusCode::FORBIDDEN,
            ApiError::feature_not_in_plan(feature_name(Feature::FeaturedListings), PLAN_ROUTE),
            &request_id,
        );
    }
    let head = PageParams {
        page: 1,
        per_page: 1,
    };
    let current = match state
        .backend
        .list_properties(&ctx.tenant.id, &Default::default(), &head)
        .await
    {
        Ok(listing) => listing.total,
        Err(e) => return backend_error(&e, &request_id),
    };
    if !plan.within_property_quota(current.min(u64::from(u32::MAX)) as u32) {
        return error_json(
            StatusCode::FORBIDDEN,
            ApiError::feature_not_in_plan("property_quota", PLAN_ROUTE),
            &request_id,
        );
    }
    match state.backend.create_property(&ctx.tenant.id, &property).await {
        Ok(created) => {
            info!(tenant = %ctx.tenant.id, property = %created.id, "property created");
            (StatusCode::CREATED, axum::Json(created)).into_response()
        }
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn update_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(property): axum::Json<Property>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    let report = validate_property(&property);
    if !report.is_ok() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::from_validation_report(&report),
            &request_id,
        );
    }
    if property.featured {
        if let Err(resp) =
            require_feature(&state, &ctx, Feature::FeaturedListings, &request_id).await
        {
            return resp;
        }
    }
    match state
        .backend
        .update_property(&ctx.tenant.id, &id, &property)
        .await
    {
        Ok(Some(updated)) => (StatusCode::OK, axum::Json(updated)).into_response(),
        Ok(None) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("property", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn delete_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    match state.backend.delete_property(&ctx.tenant.id, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("property", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn list_realtors_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    let page = match parse_page_params(&query) {
        Ok(page) => page,
        Err(err) => return error_json(StatusCode::BAD_REQUEST, err, &request_id),
    };
    match state.backend.list_realtors(&ctx.tenant.id, &page).await {
        Ok(listing) => (
            StatusCode::OK,
            axum::Json(json!({ "items": listing.items, "total": listing.total })),
        )
            .into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn create_realtor_handler(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(realtor): axum::Json<Realtor>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    let report = validate_realtor(&realtor);
    if !report.is_ok() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::from_validation_report(&report),
            &request_id,
        );
    }
    match state.backend.create_realtor(&ctx.tenant.id, &realtor).await {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn update_realtor_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(realtor): axum::Json<Realtor>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    let report = validate_realtor(&realtor);
    if !report.is_ok() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::from_validation_report(&report),
            &request_id,
        );
    }
    match state
        .backend
        .update_realtor(&ctx.tenant.id, &id, &realtor)
        .await
    {
        Ok(Some(updated)) => (StatusCode::OK, axum::Json(updated)).into_response(),
        Ok(None) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("realtor", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn delete_realtor_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    match state.backend.delete_realtor(&ctx.tenant.id, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("realtor", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn list_enterprises_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    if let Err(resp) = require_feature(&state, &ctx, Feature::Enterprises, &request_id).await {
        return resp;
    }
    let page = match parse_page_params(&query) {
        Ok(page) => page,
        Err(err) => return error_json(StatusCode::BAD_REQUEST, err, &request_id),
    };
    match state.backend.list_enterprises(&ctx.tenant.id, &page).await {
        Ok(listing) => (
            StatusCode::OK,
            axum::Json(json!({ "items": listing.items, "total": listing.total })),
        )
            .into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn create_enterprise_handler(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(enterprise): axum::Json<Enterprise>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    if let Err(resp) = require_feature(&state, &ctx, Feature::Enterprises, &request_id).await {
        return resp;
    }
    let report = validate_enterprise(&enterprise);
    if !report.is_ok() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::from_validation_report(&report),
            &request_id,
        );
    }
    match state
        .backend
        .create_enterprise(&ctx.tenant.id, &enterprise)
        .await
    {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn update_enterprise_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(enterprise): axum::Json<Enterprise>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    if let Err(resp) = require_feature(&state, &ctx, Feature::Enterprises, &request_id).await {
        return resp;
    }
    let report = validate_enterprise(&enterprise);
    if !report.is_ok() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::from_validation_report(&report),
            &request_id,
        );
    }
    match state
        .backend
        .update_enterprise(&ctx.tenant.id, &id, &enterprise)
        .await
    {
        Ok(Some(updated)) => (StatusCode::OK, axum::Json(updated)).into_response(),
        Ok(None) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("enterprise", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn delete_enterprise_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    if let Err(resp) = require_feature(&state, &ctx, Feature::Enterprises, &request_id).await {
        return resp;
    }
    match state.backend.delete_enterprise(&ctx.tenant.id, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("enterprise", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn list_clients_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    if let Err(resp) = require_feature(&state, &ctx, Feature::Clients, &request_id).await {
        return resp;
    }
    let page = match parse_page_params(&query) {
        Ok(page) => page,
        Err(err) => return error_json(StatusCode::BAD_REQUEST, err, &request_id),
    };
    match state.backend.list_clients(&ctx.tenant.id, &page).await {
        Ok(listing) => (
            StatusCode::OK,
            axum::Json(json!({ "items": listing.items, "total": listing.total })),
        )
            .into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn create_client_handler(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(client): axum::Json<Client>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    if let Err(resp) = require_feature(&state, &ctx, Feature::Clients, &request_id).await {
        return resp;
    }
    let report = validate_client(&client);
    if !report.is_ok() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::from_validation_report(&report),
            &request_id,
        );
    }
    match state.backend.create_client(&ctx.tenant.id, &client).await {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn update_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
    axum::Json(client): axum::Json<Client>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    if let Err(resp) = require_feature(&state, &ctx, Feature::Clients, &request_id).await {
        return resp;
    }
    let report = validate_client(&client);
    if !report.is_ok() {
        return error_json(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::from_validation_report(&report),
            &request_id,
        );
    }
    match state
        .backend
        .update_client(&ctx.tenant.id, &id, &client)
        .await
    {
        Ok(Some(updated)) => (StatusCode::OK, axum::Json(updated)).into_response(),
        Ok(None) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("client", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

pub async fn delete_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    if let Err(resp) = require_feature(&state, &ctx, Feature::Clients, &request_id).await {
        return resp;
    }
    match state.backend.delete_client(&ctx.tenant.id, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("client", &id),
            &request_id,
        ),
        Err(e) => backend_error(&e, &request_id),
    }
}

/// Current plan with the derived feature availability, rendered for the
/// admin UI's upgrade prompts.
pub async fn plan_handler(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    match state.backend.fetch_plan(&ctx.tenant.id).await {
        Ok(plan) => {
            let features = [
                Feature::Enterprises,
                Feature::Clients,
                Feature::FeaturedListings,
                Feature::CustomDomain,
            ]
            .into_iter()
            .map(|f| (feature_name(f), plan.allows(f)))
            .collect::<BTreeMap<_, _>>();
            (
                StatusCode::OK,
                axum::Json(json!({ "plan": plan, "features": features })),
            )
                .into_response()
        }
        Err(e) => backend_error(&e, &request_id),
    }
}
