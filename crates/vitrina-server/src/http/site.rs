use crate::http::handlers::{
    content_etag, error_json, if_none_match, not_modified, put_cache_headers,
};
use crate::middleware::request_tracing::RequestId;
use crate::middleware::tenant::TenantContext;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Extension;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::warn;
use vitrina_api::params::{parse_listing_filter, parse_page_params};
use vitrina_api::ApiError;
use vitrina_model::{TenantId, VisualConfig};

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

/// Branding for the current tenant. Falls back to the platform default on
/// any backend trouble so the public site never renders unstyled or 5xxs.
async fn visual_for(state: &AppState, tenant: &TenantId) -> VisualConfig {
    if let Some(cached) = state.visual.get(tenant).await {
        return cached;
    }
    match state.backend.fetch_visual_config(tenant).await {
        Ok(config) => {
            if config.validate().is_err() {
                warn!(tenant = %tenant, "backend returned invalid visual config");
                return VisualConfig::platform_default();
            }
            state.visual.insert(tenant.clone(), config.clone()).await;
            config
        }
        Err(e) => {
            warn!(tenant = %tenant, error = %e, "visual config fetch failed, using platform default");
            VisualConfig::platform_default()
        }
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn branded_page(title: &str, agency_name: &str, visual: &VisualConfig, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: {font}, sans-serif; color: {primary}; margin: 0; }}
header {{ background: {primary}; color: #ffffff; padding: 1rem 2rem; }}
a.cta {{ color: {secondary}; }}
</style>
</head>
<body>
<header><img src="{logo}" alt="{agency}" height="40"> {agency}</header>
<main>{body}</main>
</body>
</html>
"#,
        title = escape_html(title),
        font = visual.font_family,
        primary = visual.primary_color,
        secondary = visual.secondary_color,
        logo = escape_html(&visual.logo_url),
        agency = escape_html(agency_name),
        body = body,
    )
}

pub async fn landing_handler(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id(rid.as_ref()));
    };
    let visual = visual_for(&state, &ctx.tenant.id).await;
    let body = format!(
        "<h1>{}</h1><p><a class=\"cta\" href=\"/site/properties\">Ver imóveis</a></p>",
        escape_html(&ctx.tenant.name)
    );
    let page = branded_page(&ctx.tenant.name, &ctx.tenant.name, &visual, &body);
    Html(page).into_response()
}

pub async fn login_handler(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id(rid.as_ref()));
    };
    let visual = visual_for(&state, &ctx.tenant.id).await;
    let body = concat!(
        "<form method=\"post\" action=\"/admin/v1/session\">",
        "<label>Sessão <input type=\"password\" name=\"session\"></label>",
        "<button type=\"submit\">Entrar</button>",
        "</form>"
    );
    let page = branded_page("Login", &ctx.tenant.name, &visual, body);
    Html(page).into_response()
}

pub async fn visual_config_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ctx: Option<Extension<TenantContext>>,
    rid: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id(rid.as_ref());
    let Some(Extension(ctx)) = ctx else {
        return missing_tenant(&request_id);
    };
    let visual = visual_for(&state, &ctx.tenant.id).await;
    let body = match serde_json::to_vec(&visual) {
        Ok(body) => body,
        Err(e) => {
            return error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::backend_unavailable(&e.to_string()),
                &request_id,
            )
        }
    };
    let etag = content_etag(&body);
    if if_none_match(&headers, &etag) {
        return not_modified(&etag);
    }
    let mut resp = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response();
    put_cache_headers(&mut resp, state.config.visual_config_ttl, &etag);
    resp
}

pub async fn list_properties_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
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
    let mut filter = match parse_listing_filter(&query) {
        Ok(filter) => filter,
        Err(err) => return error_json(StatusCode::BAD_REQUEST, err, &request_id),
    };
    // The public site only ever sees published listings.
    filter.published = Some(true);

    match state
        .backend
        .list_properties(&ctx.tenant.id, &filter, &page)
        .await
    {
        Ok(listing) => {
            let payload = json!({ "items": listing.items, "total": listing.total });
            let body = serde_json::to_vec(&payload).unwrap_or_default();
            let etag = content_etag(&body);
            if if_none_match(&headers, &etag) {
                return not_modified(&etag);
            }
            let mut resp = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response();
            put_cache_headers(&mut resp, state.config.site_ttl, &etag);
            resp
        }
        Err(e) => error_json(
            StatusCode::BAD_GATEWAY,
            ApiError::backend_unavailable(&e.to_string()),
            &request_id,
        ),
    }
}

pub async fn property_detail_handler(
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
        Ok(Some(property)) if property.published => {
            (StatusCode::OK, axum::Json(property)).into_response()
        }
        Ok(_) => error_json(
            StatusCode::NOT_FOUND,
            ApiError::not_found("property", &id),
            &request_id,
        ),
        Err(e) => error_json(
            StatusCode::BAD_GATEWAY,
            ApiError::backend_unavailable(&e.to_string()),
            &request_id,
        ),
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
        Err(e) => error_json(
            StatusCode::BAD_GATEWAY,
            ApiError::backend_unavailable(&e.to_string()),
            &request_id,
        ),
    }
}
