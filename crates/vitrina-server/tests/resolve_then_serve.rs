use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use vitrina_server::{build_router, AppState, FakeBackend, GatewayConfig};

use vitrina_model::{parse_hostname, parse_tenant_id, Tenant, VisualConfig};

const TENANT_HOST: &str = "casas-sol.example.com";
const PANEL_HOST: &str = "painel.test";
const LANDING: &str = "https://landing.test";

fn seeded_fake() -> Arc<FakeBackend> {
    let fake = Arc::new(FakeBackend::default());
    let host = parse_hostname(TENANT_HOST).expect("hostname");
    let tenant = Tenant::new("ag-sol", "casas-sol", "Casas Sol").expect("tenant");
    fake.tenants.lock().expect("lock").insert(host, tenant);
    fake.visuals.lock().expect("lock").insert(
        parse_tenant_id("ag-sol").expect("tenant id"),
        VisualConfig::platform_default(),
    );
    fake
}

fn test_config() -> GatewayConfig {
    GatewayConfig {
        platform_landing_url: LANDING.to_string(),
        super_admin_hosts: vec![PANEL_HOST.to_string()],
        require_admin_session: true,
        admin_session_keys: vec!["test-admin-key".to_string()],
        ..GatewayConfig::default()
    }
}

async fn spawn_gateway(fake: Arc<FakeBackend>, config: GatewayConfig) -> SocketAddr {
    let state = AppState::with_config(fake, config);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

#[tokio::test]
async fn resolved_host_serves_the_branded_landing() {
    let fake = seeded_fake();
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/"))
        .header("host", TENANT_HOST)
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("x-request-id").is_some());
    let cookies: Vec<String> = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("__tenant__=casas-sol")));

    let body = resp.text().await.expect("body");
    assert!(body.contains("Casas Sol"));
}

#[tokio::test]
async fn repeated_requests_resolve_through_the_cache() {
    let fake = seeded_fake();
    let addr = spawn_gateway(fake.clone(), test_config()).await;

    for _ in 0..4 {
        let resp = client()
            .get(format!("http://{addr}/"))
            .header("host", TENANT_HOST)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
    }
    assert_eq!(fake.resolve_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_host_redirects_browsers_to_the_platform_landing() {
    let fake = seeded_fake();
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/"))
        .header("host", "nobody.example.com")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("location").and_then(|v| v.to_str().ok()),
        Some(LANDING)
    );
}

#[tokio::test]
async fn unknown_host_gets_an_error_envelope_for_json_clients() {
    let fake = seeded_fake();
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/site/properties"))
        .header("host", "nobody.example.com")
        .header("accept", "application/json")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"]["code"], "TENANT_NOT_RESOLVED");
    assert_eq!(body["error"]["details"]["hostname"], "nobody.example.com");
}

#[tokio::test]
async fn backend_failure_redirects_instead_of_500ing() {
    let fake = seeded_fake();
    fake.fail_resolve.store(true, Ordering::SeqCst);
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/"))
        .header("host", TENANT_HOST)
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 302);
}

#[tokio::test]
async fn site_properties_only_lists_published_records() {
    let fake = seeded_fake();
    {
        let mut properties = fake.properties.lock().expect("lock");
        let agency = parse_tenant_id("ag-sol").expect("tenant id");
        properties.push(vitrina_model::Property {
            id: "p-1".to_string(),
            agency_id: Some(agency.clone()),
            title: "Casa publicada".to_string(),
            price_cents: 50_000_000,
            city: "Curitiba".to_string(),
            realtor_id: None,
            enterprise_id: None,
            featured: false,
            published: true,
        });
        properties.push(vitrina_model::Property {
            id: "p-2".to_string(),
            agency_id: Some(agency),
            title: "Rascunho".to_string(),
            price_cents: 10_000_000,
            city: "Curitiba".to_string(),
            realtor_id: None,
            enterprise_id: None,
            featured: false,
            published: false,
        });
    }
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/site/properties"))
        .header("host", TENANT_HOST)
        .header("accept", "application/json")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("etag").is_some());
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], "p-1");
}

#[tokio::test]
async fn unpublished_property_detail_is_not_found() {
    let fake = seeded_fake();
    {
        let agency = parse_tenant_id("ag-sol").expect("tenant id");
        fake.properties
            .lock()
            .expect("lock")
            .push(vitrina_model::Property {
                id: "p-hidden".to_string(),
                agency_id: Some(agency),
                title: "Rascunho".to_string(),
                price_cents: 10_000_000,
                city: "Curitiba".to_string(),
                realtor_id: None,
                enterprise_id: None,
                featured: false,
                published: false,
            });
    }
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/site/properties/p-hidden"))
        .header("host", TENANT_HOST)
        .header("accept", "application/json")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn visual_config_falls_back_to_platform_default_on_backend_failure() {
    let fake = seeded_fake();
    fake.fail_visual.store(true, Ordering::SeqCst);
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/site/config"))
        .header("host", TENANT_HOST)
        .header("accept", "application/json")
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 200);
    let body: vitrina_model::VisualConfig = resp.json().await.expect("json");
    assert_eq!(body, vitrina_model::VisualConfig::platform_default());
}

#[tokio::test]
async fn dev_domain_override_simulates_a_tenant_host() {
    let fake = seeded_fake();
    let config = GatewayConfig {
        dev_domain_simulation: true,
        ..test_config()
    };
    let addr = spawn_gateway(fake, config).await;

    let resp = client()
        .get(format!("http://{addr}/?domain={TENANT_HOST}"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 200);
    let cookies: Vec<String> = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect();
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("__dev_domain__={TENANT_HOST}"))));
}

#[tokio::test]
async fn dev_domain_override_survives_the_landing_redirect() {
    let fake = seeded_fake();
    let config = GatewayConfig {
        dev_domain_simulation: true,
        ..test_config()
    };
    let addr = spawn_gateway(fake, config).await;

    let resp = client()
        .get(format!("http://{addr}/?domain=nobody.example.com"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("location").and_then(|v| v.to_str().ok()),
        Some(LANDING)
    );
    let cookies: Vec<String> = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(String::from))
        .collect();
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("__dev_domain__=nobody.example.com")));
}

#[tokio::test]
async fn ops_endpoints_skip_tenant_resolution() {
    let fake = seeded_fake();
    let addr = spawn_gateway(fake.clone(), test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/healthz"))
        .header("host", "nobody.example.com")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);

    let resp = client()
        .get(format!("http://{addr}/version"))
        .header("host", "nobody.example.com")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body["backend"], "fake");

    assert_eq!(fake.resolve_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn metrics_exposition_counts_requests() {
    let fake = seeded_fake();
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/"))
        .header("host", TENANT_HOST)
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);

    let resp = client()
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.expect("body");
    assert!(body.contains("vitrina_requests_total"));
    assert!(body.contains("vitrina_resolver_cache{result=\"miss\"} 1"));
}

#[tokio::test]
async fn sadmin_routes_only_exist_on_the_panel_host() {
    let fake = seeded_fake();
    let addr = spawn_gateway(fake, test_config()).await;

    let resp = client()
        .get(format!("http://{addr}/sadmin/v1/agencies"))
        .header("host", TENANT_HOST)
        .header("accept", "application/json")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 404);

    let resp = client()
        .get(format!("http://{addr}/sadmin/v1/agencies"))
        .header("host", PANEL_HOST)
        .header("accept", "application/json")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert!(body["items"].is_array());
}
