use crate::middleware::tenant::resolve_cached;
use crate::{AppState, FakeBackend, GatewayConfig};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use vitrina_model::{parse_hostname, Tenant};

fn seeded_state() -> (AppState, Arc<FakeBackend>) {
    let fake = Arc::new(FakeBackend::default());
    let host = parse_hostname("casas-sol.example.com").expect("hostname");
    let tenant = Tenant::new("ag-sol", "casas-sol", "Casas Sol").expect("tenant");
    fake.tenants
        .lock()
        .expect("lock")
        .insert(host, tenant);
    let state = AppState::new(fake.clone());
    (state, fake)
}

#[tokio::test]
async fn repeated_lookups_hit_the_backend_once() {
    let (state, fake) = seeded_state();
    let host = parse_hostname("casas-sol.example.com").expect("hostname");

    for _ in 0..5 {
        let resolved = resolve_cached(&state, &host).await.expect("resolve");
        assert_eq!(
            resolved.map(|t| t.slug.as_str().to_string()),
            Some("casas-sol".to_string())
        );
    }
    assert_eq!(fake.resolve_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_hostnames_are_negatively_cached() {
    let (state, fake) = seeded_state();
    let host = parse_hostname("nobody.example.com").expect("hostname");

    for _ in 0..3 {
        let resolved = resolve_cached(&state, &host).await.expect("resolve");
        assert!(resolved.is_none());
    }
    assert_eq!(fake.resolve_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn backend_errors_are_not_cached() {
    let (state, fake) = seeded_state();
    let host = parse_hostname("casas-sol.example.com").expect("hostname");

    fake.fail_resolve.store(true, Ordering::SeqCst);
    assert!(resolve_cached(&state, &host).await.is_err());

    fake.fail_resolve.store(false, Ordering::SeqCst);
    let resolved = resolve_cached(&state, &host).await.expect("resolve");
    assert!(resolved.is_some());
    assert_eq!(fake.resolve_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidation_forces_a_fresh_resolution() {
    let (state, fake) = seeded_state();
    let host = parse_hostname("casas-sol.example.com").expect("hostname");

    resolve_cached(&state, &host).await.expect("resolve");
    state.resolver.invalidate_all().await;
    resolve_cached(&state, &host).await.expect("resolve");
    assert_eq!(fake.resolve_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn expired_entries_resolve_again() {
    let fake = Arc::new(FakeBackend::default());
    let host = parse_hostname("casas-sol.example.com").expect("hostname");
    let tenant = Tenant::new("ag-sol", "casas-sol", "Casas Sol").expect("tenant");
    fake.tenants
        .lock()
        .expect("lock")
        .insert(host.clone(), tenant);
    let config = GatewayConfig {
        resolver_positive_ttl: Duration::from_millis(0),
        ..GatewayConfig::default()
    };
    let state = AppState::with_config(fake.clone(), config);

    resolve_cached(&state, &host).await.expect("resolve");
    resolve_cached(&state, &host).await.expect("resolve");
    assert_eq!(fake.resolve_calls.load(Ordering::SeqCst), 2);
}
