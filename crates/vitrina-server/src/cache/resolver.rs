use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use vitrina_model::{Hostname, Tenant};

/// A cached resolution. `None` records a hostname the backend does not know,
/// so repeated lookups for an unclaimed domain stay off the backend.
#[derive(Debug, Clone)]
struct ResolverEntry {
    tenant: Option<Tenant>,
    inserted_at: Instant,
}

/// Hostname to tenant cache in front of the backend resolve call. Negative
/// results get a shorter TTL so a newly claimed domain starts serving quickly.
pub struct ResolverCache {
    entries: Mutex<HashMap<Hostname, ResolverEntry>>,
    positive_ttl: Duration,
    negative_ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolverCache {
    #[must_use]
    pub fn new(positive_ttl: Duration, negative_ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            positive_ttl,
            negative_ttl,
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn ttl_for(&self, entry: &ResolverEntry) -> Duration {
        if entry.tenant.is_some() {
            self.positive_ttl
        } else {
            self.negative_ttl
        }
    }

    /// Outer `None` is a miss; `Some(None)` is a cached negative result.
    pub async fn get(&self, hostname: &Hostname) -> Option<Option<Tenant>> {
        let mut entries = self.entries.lock().await;
        match entries.get(hostname) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl_for(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.tenant.clone())
            }
            Some(_) => {
                entries.remove(hostname);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn insert(&self, hostname: Hostname, tenant: Option<Tenant>) {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&hostname) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            hostname,
            ResolverEntry {
                tenant,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, hostname: &Hostname) {
        self.entries.lock().await.remove(hostname);
    }

    /// Agency mutations can remap any hostname, so super-admin writes clear
    /// the whole map rather than chase individual keys.
    pub async fn invalidate_all(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn sweep_expired(&self) {
        let mut entries = self.entries.lock().await;
        let positive_ttl = self.positive_ttl;
        let negative_ttl = self.negative_ttl;
        entries.retain(|_, e| {
            let ttl = if e.tenant.is_some() {
                positive_ttl
            } else {
                negative_ttl
            };
            e.inserted_at.elapsed() < ttl
        });
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
