#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

mod backend;
mod cache;
pub mod config;
mod http;
mod middleware;
mod telemetry;

pub const CRATE_NAME: &str = "vitrina-server";

#[derive(Debug)]
pub struct BackendError(pub String);

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for BackendError {}

pub use backend::fake::FakeBackend;
pub use backend::http_backend::{HttpBackend, RetryPolicy};
pub use backend::{BackendApi, Page};
pub use config::{GatewayConfig, RateLimitConfig};

use cache::resolver::ResolverCache;
use cache::visual::VisualConfigCache;
use telemetry::metrics::RequestMetrics;
use telemetry::rate_limiter::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn BackendApi>,
    pub config: GatewayConfig,
    pub ready: Arc<AtomicBool>,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) resolver: Arc<ResolverCache>,
    pub(crate) visual: Arc<VisualConfigCache>,
    pub(crate) ip_limiter: Arc<RateLimiter>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn BackendApi>) -> Self {
        Self::with_config(backend, GatewayConfig::default())
    }

    #[must_use]
    pub fn with_config(backend: Arc<dyn BackendApi>, config: GatewayConfig) -> Self {
        Self {
            backend,
            resolver: Arc::new(ResolverCache::new(
                config.resolver_positive_ttl,
                config.resolver_negative_ttl,
                config.resolver_max_entries,
            )),
            visual: Arc::new(VisualConfigCache::new(config.visual_config_ttl)),
            ip_limiter: Arc::new(RateLimiter::new()),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            ready: Arc::new(AtomicBool::new(false)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            config,
        }
    }

    /// Periodic sweep of expired resolver entries so an idle gateway does not
    /// hold stale tenants until the next lookup touches them.
    pub fn spawn_background_tasks(&self) {
        let resolver = Arc::clone(&self.resolver);
        let interval = self.config.resolver_sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                resolver.sweep_expired().await;
            }
        });
    }
}

pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/admin/v1/properties",
            get(http::admin::list_properties_handler).post(http::admin::create_property_handler),
        )
        .route(
            "/admin/v1/properties/{id}",
            get(http::admin::get_property_handler)
                .put(http::admin::update_property_handler)
                .delete(http::admin::delete_property_handler),
        )
        .route(
            "/admin/v1/realtors",
            get(http::admin::list_realtors_handler).post(http::admin::create_realtor_handler),
        )
        .route(
            "/admin/v1/realtors/{id}",
            axum::routing::put(http::admin::update_realtor_handler)
                .delete(http::admin::delete_realtor_handler),
        )
        .route(
            "/admin/v1/enterprises",
            get(http::admin::list_enterprises_handler)
                .post(http::admin::create_enterprise_handler),
        )
        .route(
            "/admin/v1/enterprises/{id}",
            axum::routing::put(http::admin::update_enterprise_handler)
                .delete(http::admin::delete_enterprise_handler),
        )
        .route(
            "/admin/v1/clients",
            get(http::admin::list_clients_handler).post(http::admin::create_client_handler),
        )
        .route(
            "/admin/v1/clients/{id}",
            axum::routing::put(http::admin::update_client_handler)
                .delete(http::admin::delete_client_handler),
        )
        .route("/admin/v1/plan", get(http::admin::plan_handler));

    let sadmin = Router::new()
        .route(
            "/sadmin/v1/agencies",
            get(http::sadmin::list_agencies_handler).post(http::sadmin::create_agency_handler),
        )
        .route(
            "/sadmin/v1/agencies/{id}",
            axum::routing::put(http::sadmin::update_agency_handler),
        )
        .route("/sadmin/v1/plans", get(http::sadmin::list_plans_handler))
        .route(
            "/sadmin/v1/plans/{id}",
            axum::routing::put(http::sadmin::update_plan_handler),
        );

    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/version", get(http::handlers::version_handler))
        .route("/", get(http::site::landing_handler))
        .route("/login", get(http::site::login_handler))
        .route("/site/config", get(http::site::visual_config_handler))
        .route("/site/properties", get(http::site::list_properties_handler))
        .route(
            "/site/properties/{id}",
            get(http::site::property_detail_handler),
        )
        .route("/site/realtors", get(http::site::list_realtors_handler))
        .merge(admin)
        .merge(sadmin)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::tenant::tenant_resolution_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}

#[cfg(test)]
mod resolver_tests;
