use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 30.0,
            refill_per_sec: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayConfig {
    pub backend_base_url: String,
    #[serde(skip_serializing)]
    pub backend_token: Option<String>,
    pub platform_landing_url: String,
    /// Hosts that serve the cross-tenant super-admin panel instead of a
    /// tenant site. Stored normalized (lowercase, no port).
    pub super_admin_hosts: Vec<String>,
    /// Allows `?domain=` / `__dev_domain__` hostname substitution.
    pub dev_domain_simulation: bool,
    pub resolver_positive_ttl: Duration,
    pub resolver_negative_ttl: Duration,
    pub resolver_max_entries: usize,
    pub resolver_sweep_interval: Duration,
    pub visual_config_ttl: Duration,
    pub site_ttl: Duration,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    pub enable_ip_rate_limit: bool,
    pub rate_limit_per_ip: RateLimitConfig,
    pub require_admin_session: bool,
    #[serde(skip_serializing)]
    pub admin_session_keys: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_base_url: "http://127.0.0.1:9000".to_string(),
            backend_token: None,
            platform_landing_url: "https://www.vitrina.app".to_string(),
            super_admin_hosts: vec!["painel.vitrina.app".to_string()],
            dev_domain_simulation: false,
            resolver_positive_ttl: Duration::from_secs(300),
            resolver_negative_ttl: Duration::from_secs(30),
            resolver_max_entries: 1024,
            resolver_sweep_interval: Duration::from_secs(60),
            visual_config_ttl: Duration::from_secs(60),
            site_ttl: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
            max_body_bytes: 256 * 1024,
            enable_ip_rate_limit: false,
            rate_limit_per_ip: RateLimitConfig::default(),
            require_admin_session: true,
            admin_session_keys: Vec::new(),
        }
    }
}

pub fn validate_startup_config_contract(config: &GatewayConfig) -> Result<(), String> {
    let base = config.backend_base_url.trim();
    if base.is_empty() || !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err("backend base url must be a http(s) url".to_string());
    }
    if config.platform_landing_url.trim().is_empty() {
        return Err("platform landing url must not be empty".to_string());
    }
    if config.resolver_positive_ttl.is_zero() || config.resolver_negative_ttl.is_zero() {
        return Err("resolver ttls must be > 0".to_string());
    }
    if config.resolver_max_entries == 0 {
        return Err("resolver capacity must be > 0".to_string());
    }
    if config.visual_config_ttl.is_zero() {
        return Err("visual config ttl must be > 0".to_string());
    }
    if config.request_timeout.is_zero() {
        return Err("request timeout must be > 0".to_string());
    }
    if config.max_body_bytes == 0 {
        return Err("max body bytes must be > 0".to_string());
    }
    if config.enable_ip_rate_limit
        && (config.rate_limit_per_ip.capacity <= 0.0 || config.rate_limit_per_ip.refill_per_sec <= 0.0)
    {
        return Err("ip rate limit requires positive capacity and refill".to_string());
    }
    if config.require_admin_session && config.admin_session_keys.is_empty() {
        return Err(
            "require_admin_session=true requires at least one admin session key".to_string(),
        );
    }
    for host in &config.super_admin_hosts {
        if vitrina_model::parse_hostname(host).map(|h| h.into_inner()) != Ok(host.clone()) {
            return Err(format!("super admin host is not normalized: {host}"));
        }
    }
    Ok(())
}
