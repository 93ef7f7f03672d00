use crate::http::handlers::error_json;
use crate::middleware::request_tracing::RequestId;
use crate::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cookie::Cookie;
use tracing::{debug, warn};
use vitrina_api::{
    ApiError, AGENCY_ID_HEADER, DEV_DOMAIN_COOKIE, SESSION_COOKIE, TENANT_COOKIE,
    TENANT_ID_HEADER, TENANT_SLUG_HEADER,
};
use vitrina_model::{Hostname, Tenant};

/// Resolved tenant for the current request, inserted by the middleware and
/// read by every site and admin handler.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: Tenant,
    pub hostname: Hostname,
}

/// Marker granted only to requests arriving on a configured super-admin host.
#[derive(Debug, Clone, Copy)]
pub struct SuperAdminScope;

const STATIC_PATHS: &[&str] = &[
    "/healthz",
    "/readyz",
    "/metrics",
    "/version",
    "/favicon.ico",
    "/robots.txt",
];

fn is_static_path(path: &str) -> bool {
    if STATIC_PATHS.contains(&path) || path.starts_with("/assets/") {
        return true;
    }
    // Asset-like paths with a file extension skip resolution entirely.
    path.rsplit('/')
        .next()
        .map(|seg| seg.contains('.'))
        .unwrap_or(false)
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for parsed in Cookie::split_parse(raw) {
            if let Ok(c) = parsed {
                if c.name() == name {
                    return Some(c.value().to_string());
                }
            }
        }
    }
    None
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(|v| v.to_string());
        }
    }
    None
}

fn redirect(location: &str) -> Response {
    let mut resp = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        resp.headers_mut().insert(header::LOCATION, value);
    }
    resp
}

fn with_dev_cookie(mut resp: Response, dev_override: &Option<String>) -> Response {
    if let Some(domain) = dev_override {
        append_cookie(&mut resp, DEV_DOMAIN_COOKIE, domain);
    }
    resp
}

fn append_cookie(resp: &mut Response, name: &str, value: &str) {
    let cookie = Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .same_site(cookie::SameSite::Lax)
        .build();
    if let Ok(header_value) = HeaderValue::from_str(&cookie.to_string()) {
        resp.headers_mut().append(header::SET_COOKIE, header_value);
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn admin_session_ok(state: &AppState, headers: &HeaderMap) -> bool {
    if !state.config.require_admin_session {
        return true;
    }
    let presented = bearer_token(headers).or_else(|| cookie_value(headers, SESSION_COOKIE));
    match presented {
        Some(token) => state
            .config
            .admin_session_keys
            .iter()
            .any(|key| key == &token),
        None => false,
    }
}

/// Request hostname, preferring the dev-domain override when simulation is
/// enabled. The second tuple element is the override from the query string,
/// which the response echoes back as a cookie.
fn effective_hostname(
    state: &AppState,
    req: &Request,
) -> (Result<Hostname, String>, Option<String>) {
    if state.config.dev_domain_simulation {
        if let Some(domain) = query_param(req.uri().query(), "domain") {
            return (
                Hostname::parse(&domain).map_err(|e| e.to_string()),
                Some(domain),
            );
        }
        if let Some(domain) = cookie_value(req.headers(), DEV_DOMAIN_COOKIE) {
            return (Hostname::parse(&domain).map_err(|e| e.to_string()), None);
        }
    }
    let raw = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    (Hostname::parse(raw).map_err(|e| e.to_string()), None)
}

pub(crate) async fn resolve_cached(
    state: &AppState,
    hostname: &Hostname,
) -> Result<Option<Tenant>, String> {
    if let Some(cached) = state.resolver.get(hostname).await {
        return Ok(cached);
    }
    match state.backend.resolve_tenant(hostname).await {
        Ok(resolved) => {
            state
                .resolver
                .insert(hostname.clone(), resolved.clone())
                .await;
            Ok(resolved)
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Hostname based tenant resolution. Runs on every request and either
/// attaches a `TenantContext` (or `SuperAdminScope`) or ends the request
/// with a redirect or an error envelope.
pub async fn tenant_resolution_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_static_path(&path) {
        return next.run(req).await;
    }

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "req-unknown".to_string());

    // Inbound copies of the gateway's own headers are never trusted.
    let headers = req.headers_mut();
    headers.remove(TENANT_ID_HEADER);
    headers.remove(TENANT_SLUG_HEADER);
    headers.remove(AGENCY_ID_HEADER);

    if state.config.enable_ip_rate_limit {
        let ip = client_ip(req.headers());
        if !state
            .ip_limiter
            .allow(&ip, &state.config.rate_limit_per_ip)
            .await
        {
            warn!(client_ip = %ip, "request rate limited");
            return error_json(
                StatusCode::TOO_MANY_REQUESTS,
                ApiError::rate_limited(),
                &request_id,
            );
        }
    }

    let (hostname, dev_override) = effective_hostname(&state, &req);
    let hostname = match hostname {
        Ok(hostname) => hostname,
        Err(reason) => {
            debug!(reason = %reason, "unparseable request hostname");
            if wants_json(req.headers()) {
                return error_json(
                    StatusCode::NOT_FOUND,
                    ApiError::tenant_not_resolved("invalid"),
                    &request_id,
                );
            }
            return redirect(&state.config.platform_landing_url);
        }
    };

    let is_super_admin_host = state
        .config
        .super_admin_hosts
        .iter()
        .any(|h| h == hostname.as_str());

    if path.starts_with("/sadmin") {
        if !is_super_admin_host {
            // Super-admin routes do not exist on tenant hosts.
            return error_json(
                StatusCode::NOT_FOUND,
                ApiError::not_found("route", &path),
                &request_id,
            );
        }
        req.extensions_mut().insert(SuperAdminScope);
        return next.run(req).await;
    }
    if is_super_admin_host {
        // The panel host serves only the super-admin surface.
        return redirect(&state.config.platform_landing_url);
    }

    // Failure paths still persist a `?domain=` override so the simulated
    // host survives the redirect loop during local development.
    let tenant = match resolve_cached(&state, &hostname).await {
        Ok(Some(tenant)) => tenant,
        Ok(None) => {
            debug!(hostname = %hostname, "hostname not claimed by any agency");
            let resp = if wants_json(req.headers()) {
                error_json(
                    StatusCode::NOT_FOUND,
                    ApiError::tenant_not_resolved(hostname.as_str()),
                    &request_id,
                )
            } else {
                redirect(&state.config.platform_landing_url)
            };
            return with_dev_cookie(resp, &dev_override);
        }
        Err(reason) => {
            warn!(hostname = %hostname, reason = %reason, "tenant resolution failed");
            let resp = if wants_json(req.headers()) {
                error_json(
                    StatusCode::BAD_GATEWAY,
                    ApiError::backend_unavailable(&reason),
                    &request_id,
                )
            } else {
                redirect(&state.config.platform_landing_url)
            };
            return with_dev_cookie(resp, &dev_override);
        }
    };

    if path.starts_with("/admin") && !admin_session_ok(&state, req.headers()) {
        let resp = if wants_json(req.headers()) {
            error_json(
                StatusCode::UNAUTHORIZED,
                ApiError::unauthorized("missing or invalid admin session"),
                &request_id,
            )
        } else {
            redirect("/login")
        };
        return with_dev_cookie(resp, &dev_override);
    }

    let slug = tenant.slug.as_str().to_string();
    if let Ok(value) = HeaderValue::from_str(tenant.id.as_str()) {
        req.headers_mut().insert(TENANT_ID_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&slug) {
        req.headers_mut().insert(TENANT_SLUG_HEADER, value);
    }
    req.extensions_mut().insert(TenantContext {
        tenant,
        hostname,
    });

    let mut resp = next.run(req).await;
    append_cookie(&mut resp, TENANT_COOKIE, &slug);
    if let Some(domain) = dev_override {
        append_cookie(&mut resp, DEV_DOMAIN_COOKIE, &domain);
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_paths_skip_resolution() {
        assert!(is_static_path("/healthz"));
        assert!(is_static_path("/assets/app.css"));
        assert!(is_static_path("/favicon.ico"));
        assert!(is_static_path("/site/og-image.png"));
        assert!(!is_static_path("/site/properties"));
        assert!(!is_static_path("/"));
    }

    #[test]
    fn cookie_lookup_scans_all_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; b=2"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("__tenant__=imob-sol"),
        );
        assert_eq!(
            cookie_value(&headers, TENANT_COOKIE),
            Some("imob-sol".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn first_forwarded_ip_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.9");

        let empty = HeaderMap::new();
        assert_eq!(client_ip(&empty), "unknown");
    }

    #[test]
    fn query_param_extraction_handles_multiple_pairs() {
        assert_eq!(
            query_param(Some("page=2&domain=imob.example.com"), "domain"),
            Some("imob.example.com".to_string())
        );
        assert_eq!(query_param(Some("page=2"), "domain"), None);
        assert_eq!(query_param(None, "domain"), None);
    }

    #[test]
    fn bearer_tokens_are_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer  admin-key-1 "),
        );
        assert_eq!(bearer_token(&headers), Some("admin-key-1".to_string()));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }
}
