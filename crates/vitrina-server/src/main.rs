#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use vitrina_server::config::validate_startup_config_contract;
use vitrina_server::{build_router, AppState, GatewayConfig, HttpBackend, RateLimitConfig, RetryPolicy};

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn env_list(name: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(name) {
        Ok(raw) => raw
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
        Err(_) => default.iter().map(|v| v.to_string()).collect(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("VITRINA_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn config_from_env() -> GatewayConfig {
    let defaults = GatewayConfig::default();
    GatewayConfig {
        backend_base_url: env_string("VITRINA_API_URL", &defaults.backend_base_url),
        backend_token: env_opt("VITRINA_API_TOKEN"),
        platform_landing_url: env_string("VITRINA_LANDING_URL", &defaults.platform_landing_url),
        super_admin_hosts: env_list("VITRINA_SUPER_ADMIN_HOSTS", &["painel.vitrina.app"]),
        dev_domain_simulation: env_bool("VITRINA_DEV_DOMAIN_SIMULATION", false),
        resolver_positive_ttl: env_duration_ms("VITRINA_RESOLVER_POSITIVE_TTL_MS", 300_000),
        resolver_negative_ttl: env_duration_ms("VITRINA_RESOLVER_NEGATIVE_TTL_MS", 30_000),
        resolver_max_entries: env_usize("VITRINA_RESOLVER_MAX_ENTRIES", 1024),
        resolver_sweep_interval: env_duration_ms("VITRINA_RESOLVER_SWEEP_INTERVAL_MS", 60_000),
        visual_config_ttl: env_duration_ms("VITRINA_VISUAL_CONFIG_TTL_MS", 60_000),
        site_ttl: env_duration_ms("VITRINA_SITE_TTL_MS", 30_000),
        request_timeout: env_duration_ms("VITRINA_REQUEST_TIMEOUT_MS", 5_000),
        max_body_bytes: env_usize("VITRINA_MAX_BODY_BYTES", 256 * 1024),
        enable_ip_rate_limit: env_bool("VITRINA_ENABLE_IP_RATE_LIMIT", false),
        rate_limit_per_ip: RateLimitConfig {
            capacity: env_f64("VITRINA_RATE_LIMIT_CAPACITY", 30.0),
            refill_per_sec: env_f64("VITRINA_RATE_LIMIT_REFILL_PER_SEC", 10.0),
        },
        require_admin_session: env_bool("VITRINA_REQUIRE_ADMIN_SESSION", true),
        admin_session_keys: env_list("VITRINA_ADMIN_SESSION_KEYS", &[]),
    }
}

/// Flips the readiness flag once the backend answers. The gateway keeps
/// serving cached and fallback content even while the probe is failing.
fn spawn_readiness_probe(state: AppState) {
    tokio::spawn(async move {
        loop {
            match state.backend.list_plans().await {
                Ok(_) => {
                    state
                        .ready
                        .store(true, std::sync::atomic::Ordering::SeqCst);
                    info!("backend probe succeeded, gateway ready");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "backend probe failed, retrying");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

async fn shutdown_signal(state: AppState, drain: Duration) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!(drain_ms = drain.as_millis() as u64, "shutdown signal received, draining");
    state
        .accepting_requests
        .store(false, std::sync::atomic::Ordering::SeqCst);
    state.ready.store(false, std::sync::atomic::Ordering::SeqCst);
    tokio::time::sleep(drain).await;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = config_from_env();
    validate_startup_config_contract(&config)?;

    let backend = Arc::new(HttpBackend::new(
        config.backend_base_url.clone(),
        config.backend_token.clone(),
        RetryPolicy {
            max_attempts: env_usize("VITRINA_BACKEND_RETRY_ATTEMPTS", 2).max(1),
            base_backoff_ms: env_u64("VITRINA_BACKEND_RETRY_BACKOFF_MS", 200),
        },
        config.request_timeout,
        env_bool("VITRINA_ALLOW_PRIVATE_BACKEND", true),
    ));

    let state = AppState::with_config(backend, config);
    state.spawn_background_tasks();
    spawn_readiness_probe(state.clone());

    let addr: SocketAddr = env_string("VITRINA_LISTEN", "0.0.0.0:8080").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        listen = %addr,
        backend = %state.config.backend_base_url,
        super_admin_hosts = ?state.config.super_admin_hosts,
        "vitrina gateway listening"
    );

    let drain = env_duration_ms("VITRINA_SHUTDOWN_DRAIN_MS", 3_000);
    let app = build_router(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state, drain))
        .await?;
    Ok(())
}
