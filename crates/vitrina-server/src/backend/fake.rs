use crate::backend::{BackendApi, Page};
use crate::BackendError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use vitrina_api::params::{ListingFilter, PageParams};
use vitrina_model::{
    Agency, Client, Enterprise, Hostname, Plan, Property, Realtor, Tenant, TenantId, VisualConfig,
};

/// In-memory backend for tests. Fields are public so tests can seed data
/// directly and assert on call counts.
#[derive(Default)]
pub struct FakeBackend {
    pub tenants: Mutex<HashMap<Hostname, Tenant>>,
    pub visuals: Mutex<HashMap<TenantId, VisualConfig>>,
    pub tenant_plans: Mutex<HashMap<TenantId, Plan>>,
    pub properties: Mutex<Vec<Property>>,
    pub realtors: Mutex<Vec<Realtor>>,
    pub enterprises: Mutex<Vec<Enterprise>>,
    pub clients: Mutex<Vec<Client>>,
    pub agencies: Mutex<Vec<Agency>>,
    pub plans: Mutex<Vec<Plan>>,
    pub resolve_calls: AtomicU64,
    pub visual_calls: AtomicU64,
    pub plan_calls: AtomicU64,
    pub fail_resolve: AtomicBool,
    pub fail_visual: AtomicBool,
    pub fail_listings: AtomicBool,
    next_id: AtomicU64,
}

impl FakeBackend {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }

    fn check_listings(&self) -> Result<(), BackendError> {
        if self.fail_listings.load(Ordering::SeqCst) {
            return Err(BackendError("injected listing failure".to_string()));
        }
        Ok(())
    }

    fn owned_by(tenant: &TenantId, owner: &Option<TenantId>) -> bool {
        owner.as_ref() == Some(tenant)
    }

    fn paginate<T: Clone>(items: Vec<T>, page: &PageParams) -> Page<T> {
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(page.offset())
            .take(page.per_page)
            .collect();
        Page { items, total }
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    fn backend_tag(&self) -> &'static str {
        "fake"
    }

    async fn resolve_tenant(&self, hostname: &Hostname) -> Result<Option<Tenant>, BackendError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_resolve.load(Ordering::SeqCst) {
            return Err(BackendError("injected resolve failure".to_string()));
        }
        let tenants = self.tenants.lock().map_err(|_| lock_error())?;
        Ok(tenants.get(hostname).cloned())
    }

    async fn fetch_visual_config(&self, tenant: &TenantId) -> Result<VisualConfig, BackendError> {
        self.visual_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_visual.load(Ordering::SeqCst) {
            return Err(BackendError("injected visual failure".to_string()));
        }
        let visuals = self.visuals.lock().map_err(|_| lock_error())?;
        visuals
            .get(tenant)
            .cloned()
            .ok_or_else(|| BackendError("visual config missing for agency".to_string()))
    }

    async fn fetch_plan(&self, tenant: &TenantId) -> Result<Plan, BackendError> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        let plans = self.tenant_plans.lock().map_err(|_| lock_error())?;
        plans
            .get(tenant)
            .cloned()
            .ok_or_else(|| BackendError("plan missing for agency".to_string()))
    }

    async fn list_properties(
        &self,
        tenant: &TenantId,
        filter: &ListingFilter,
        page: &PageParams,
    ) -> Result<Page<Property>, BackendError> {
        self.check_listings()?;
        let properties = self.properties.lock().map_err(|_| lock_error())?;
        let matched: Vec<Property> = properties
            .iter()
            .filter(|p| Self::owned_by(tenant, &p.agency_id))
            .filter(|p| {
                filter
                    .city
                    .as_ref()
                    .map_or(true, |c| p.city.eq_ignore_ascii_case(c))
            })
            .filter(|p| filter.featured.map_or(true, |f| p.featured == f))
            .filter(|p| filter.published.map_or(true, |f| p.published == f))
            .cloned()
            .collect();
        Ok(Self::paginate(matched, page))
    }

    async fn get_property(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> Result<Option<Property>, BackendError> {
        self.check_listings()?;
        let properties = self.properties.lock().map_err(|_| lock_error())?;
        Ok(properties
            .iter()
            .find(|p| p.id == id && Self::owned_by(tenant, &p.agency_id))
            .cloned())
    }

    async fn create_property(
        &self,
        tenant: &TenantId,
        property: &Property,
    ) -> Result<Property, BackendError> {
        self.check_listings()?;
        let mut created = property.clone();
        if created.id.is_empty() {
            created.id = self.next_id("prop");
        }
        created.agency_id = Some(tenant.clone());
        let mut properties = self.properties.lock().map_err(|_| lock_error())?;
        properties.push(created.clone());
        Ok(created)
    }

    async fn update_property(
        &self,
        tenant: &TenantId,
        id: &str,
        property: &Property,
    ) -> Result<Option<Property>, BackendError> {
        self.check_listings()?;
        let mut properties = self.properties.lock().map_err(|_| lock_error())?;
        let Some(slot) = properties
            .iter_mut()
            .find(|p| p.id == id && Self::owned_by(tenant, &p.agency_id))
        else {
            return Ok(None);
        };
        let mut updated = property.clone();
        updated.id = id.to_string();
        updated.agency_id = Some(tenant.clone());
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_property(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError> {
        self.check_listings()?;
        let mut properties = self.properties.lock().map_err(|_| lock_error())?;
        let before = properties.len();
        properties.retain(|p| !(p.id == id && Self::owned_by(tenant, &p.agency_id)));
        Ok(properties.len() < before)
    }

    async fn list_realtors(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Realtor>, BackendError> {
        self.check_listings()?;
        let realtors = self.realtors.lock().map_err(|_| lock_error())?;
        let matched: Vec<Realtor> = realtors
            .iter()
            .filter(|r| Self::owned_by(tenant, &r.agency_id))
            .cloned()
            .collect();
        Ok(Self::paginate(matched, page))
    }

    async fn create_realtor(
        &self,
        tenant: &TenantId,
        realtor: &Realtor,
    ) -> Result<Realtor, BackendError> {
        self.check_listings()?;
        let mut created = realtor.clone();
        if created.id.is_empty() {
            created.id = self.next_id("realtor");
        }
        created.agency_id = Some(tenant.clone());
        let mut realtors = self.realtors.lock().map_err(|_| lock_error())?;
        realtors.push(created.clone());
        Ok(created)
    }

    async fn update_realtor(
        &self,
        tenant: &TenantId,
        id: &str,
        realtor: &Realtor,
    ) -> Result<Option<Realtor>, BackendError> {
        self.check_listings()?;
        let mut realtors = self.realtors.lock().map_err(|_| lock_error())?;
        let Some(slot) = realtors
            .iter_mut()
            .find(|r| r.id == id && Self::owned_by(tenant, &r.agency_id))
        else {
            return Ok(None);
        };
        let mut updated = realtor.clone();
        updated.id = id.to_string();
        updated.agency_id = Some(tenant.clone());
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_realtor(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError> {
        self.check_listings()?;
        let mut realtors = self.realtors.lock().map_err(|_| lock_error())?;
        let before = realtors.len();
        realtors.retain(|r| !(r.id == id && Self::owned_by(tenant, &r.agency_id)));
        Ok(realtors.len() < before)
    }

    async fn list_enterprises(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Enterprise>, BackendError> {
        self.check_listings()?;
        let enterprises = self.enterprises.lock().map_err(|_| lock_error())?;
        let matched: Vec<Enterprise> = enterprises
            .iter()
            .filter(|e| Self::owned_by(tenant, &e.agency_id))
            .cloned()
            .collect();
        Ok(Self::paginate(matched, page))
    }

    async fn create_enterprise(
        &self,
        tenant: &TenantId,
        enterprise: &Enterprise,
    ) -> Result<Enterprise, BackendError> {
        self.check_listings()?;
        let mut created = enterprise.clone();
        if created.id.is_empty() {
            created.id = self.next_id("ent");
        }
        created.agency_id = Some(tenant.clone());
        let mut enterprises = self.enterprises.lock().map_err(|_| lock_error())?;
        enterprises.push(created.clone());
        Ok(created)
    }

    async fn update_enterprise(
        &self,
        tenant: &TenantId,
        id: &str,
        enterprise: &Enterprise,
    ) -> Result<Option<Enterprise>, BackendError> {
        self.check_listings()?;
        let mut enterprises = self.enterprises.lock().map_err(|_| lock_error())?;
        let Some(slot) = enterprises
            .iter_mut()
            .find(|e| e.id == id && Self::owned_by(tenant, &e.agency_id))
        else {
            return Ok(None);
        };
        let mut updated = enterprise.clone();
        updated.id = id.to_string();
        updated.agency_id = Some(tenant.clone());
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_enterprise(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError> {
        self.check_listings()?;
        let mut enterprises = self.enterprises.lock().map_err(|_| lock_error())?;
        let before = enterprises.len();
        enterprises.retain(|e| !(e.id == id && Self::owned_by(tenant, &e.agency_id)));
        Ok(enterprises.len() < before)
    }

    async fn list_clients(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Client>, BackendError> {
        self.check_listings()?;
        let clients = self.clients.lock().map_err(|_| lock_error())?;
        let matched: Vec<Client> = clients
            .iter()
            .filter(|c| Self::owned_by(tenant, &c.agency_id))
            .cloned()
            .collect();
        Ok(Self::paginate(matched, page))
    }

    async fn create_client(
        &self,
        tenant: &TenantId,
        client: &Client,
    ) -> Result<Client, BackendError> {
        self.check_listings()?;
        let mut created = client.clone();
        if created.id.is_empty() {
            created.id = self.next_id("client");
        }
        created.agency_id = Some(tenant.clone());
        let mut clients = self.clients.lock().map_err(|_| lock_error())?;
        clients.push(created.clone());
        Ok(created)
    }

    async fn update_client(
        &self,
        tenant: &TenantId,
        id: &str,
        client: &Client,
    ) -> Result<Option<Client>, BackendError> {
        self.check_listings()?;
        let mut clients = self.clients.lock().map_err(|_| lock_error())?;
        let Some(slot) = clients
            .iter_mut()
            .find(|c| c.id == id && Self::owned_by(tenant, &c.agency_id))
        else {
            return Ok(None);
        };
        let mut updated = client.clone();
        updated.id = id.to_string();
        updated.agency_id = Some(tenant.clone());
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_client(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError> {
        self.check_listings()?;
        let mut clients = self.clients.lock().map_err(|_| lock_error())?;
        let before = clients.len();
        clients.retain(|c| !(c.id == id && Self::owned_by(tenant, &c.agency_id)));
        Ok(clients.len() < before)
    }

    async fn list_agencies(&self) -> Result<Vec<Agency>, BackendError> {
        let agencies = self.agencies.lock().map_err(|_| lock_error())?;
        Ok(agencies.clone())
    }

    async fn create_agency(&self, agency: &Agency) -> Result<Agency, BackendError> {
        let mut agencies = self.agencies.lock().map_err(|_| lock_error())?;
        agencies.push(agency.clone());
        Ok(agency.clone())
    }

    async fn update_agency(
        &self,
        id: &TenantId,
        agency: &Agency,
    ) -> Result<Option<Agency>, BackendError> {
        let mut agencies = self.agencies.lock().map_err(|_| lock_error())?;
        let Some(slot) = agencies.iter_mut().find(|a| &a.id == id) else {
            return Ok(None);
        };
        *slot = agency.clone();
        Ok(Some(agency.clone()))
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, BackendError> {
        let plans = self.plans.lock().map_err(|_| lock_error())?;
        Ok(plans.clone())
    }

    async fn update_plan(&self, id: &str, plan: &Plan) -> Result<Option<Plan>, BackendError> {
        let mut plans = self.plans.lock().map_err(|_| lock_error())?;
        let Some(slot) = plans.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        *slot = plan.clone();
        Ok(Some(plan.clone()))
    }
}

fn lock_error() -> BackendError {
    BackendError("fake backend lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrina_model::parse_tenant_id;

    fn property(id: &str, city: &str, published: bool) -> Property {
        Property {
            id: id.to_string(),
            agency_id: None,
            title: format!("Listing {id}"),
            price_cents: 42_000_000,
            city: city.to_string(),
            realtor_id: None,
            enterprise_id: None,
            featured: false,
            published,
        }
    }

    #[tokio::test]
    async fn properties_are_scoped_to_the_owning_tenant() {
        let backend = FakeBackend::default();
        let a = parse_tenant_id("ag-a").unwrap();
        let b = parse_tenant_id("ag-b").unwrap();
        backend
            .create_property(&a, &property("", "Curitiba", true))
            .await
            .unwrap();
        backend
            .create_property(&b, &property("", "Curitiba", true))
            .await
            .unwrap();

        let page = backend
            .list_properties(&a, &ListingFilter::default(), &PageParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].agency_id, Some(a));
    }

    #[tokio::test]
    async fn city_filter_is_case_insensitive() {
        let backend = FakeBackend::default();
        let a = parse_tenant_id("ag-a").unwrap();
        backend
            .create_property(&a, &property("", "Curitiba", true))
            .await
            .unwrap();

        let filter = ListingFilter {
            city: Some("curitiba".to_string()),
            ..ListingFilter::default()
        };
        let page = backend
            .list_properties(&a, &filter, &PageParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn cross_tenant_delete_is_a_miss() {
        let backend = FakeBackend::default();
        let a = parse_tenant_id("ag-a").unwrap();
        let b = parse_tenant_id("ag-b").unwrap();
        let created = backend
            .create_property(&a, &property("", "Recife", true))
            .await
            .unwrap();

        assert!(!backend.delete_property(&b, &created.id).await.unwrap());
        assert!(backend.delete_property(&a, &created.id).await.unwrap());
    }

    #[tokio::test]
    async fn injected_resolve_failure_surfaces_as_backend_error() {
        let backend = FakeBackend::default();
        backend.fail_resolve.store(true, Ordering::SeqCst);
        let host = vitrina_model::parse_hostname("imob.example.com").unwrap();
        assert!(backend.resolve_tenant(&host).await.is_err());
        assert_eq!(backend.resolve_calls.load(Ordering::SeqCst), 1);
    }
}
