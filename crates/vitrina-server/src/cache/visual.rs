use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use vitrina_model::{TenantId, VisualConfig};

/// Short-lived per-agency branding cache. Admin mutations invalidate the
/// owning tenant's entry so the public site picks up edits within one request.
pub struct VisualConfigCache {
    entries: Mutex<HashMap<TenantId, (VisualConfig, Instant)>>,
    ttl: Duration,
}

impl VisualConfigCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, tenant: &TenantId) -> Option<VisualConfig> {
        let mut entries = self.entries.lock().await;
        match entries.get(tenant) {
            Some((config, inserted_at)) if inserted_at.elapsed() < self.ttl => {
                Some(config.clone())
            }
            Some(_) => {
                entries.remove(tenant);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, tenant: TenantId, config: VisualConfig) {
        self.entries
            .lock()
            .await
            .insert(tenant, (config, Instant::now()));
    }

    pub async fn invalidate(&self, tenant: &TenantId) {
        self.entries.lock().await.remove(tenant);
    }
}
