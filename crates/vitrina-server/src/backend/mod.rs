use crate::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vitrina_api::params::{ListingFilter, PageParams};
use vitrina_model::{
    Agency, Client, Enterprise, Hostname, Plan, Property, Realtor, Tenant, TenantId, VisualConfig,
};

pub mod fake;
pub mod http_backend;

/// One page of a backend listing. `total` is the unfiltered match count the
/// backend reports; the admin UI uses it for pagination and the gateway uses
/// it for plan quota checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Everything the gateway asks of the backend API. All tenant-scoped calls
/// are stamped with `x-agency-id`; the super-admin calls are not.
#[async_trait]
pub trait BackendApi: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    /// `GET /resolve-tenant?hostname=...`; a backend 404 is `Ok(None)`.
    async fn resolve_tenant(&self, hostname: &Hostname) -> Result<Option<Tenant>, BackendError>;

    async fn fetch_visual_config(&self, tenant: &TenantId) -> Result<VisualConfig, BackendError>;

    async fn fetch_plan(&self, tenant: &TenantId) -> Result<Plan, BackendError>;

    async fn list_properties(
        &self,
        tenant: &TenantId,
        filter: &ListingFilter,
        page: &PageParams,
    ) -> Result<Page<Property>, BackendError>;

    async fn get_property(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> Result<Option<Property>, BackendError>;

    async fn create_property(
        &self,
        tenant: &TenantId,
        property: &Property,
    ) -> Result<Property, BackendError>;

    async fn update_property(
        &self,
        tenant: &TenantId,
        id: &str,
        property: &Property,
    ) -> Result<Option<Property>, BackendError>;

    async fn delete_property(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError>;

    async fn list_realtors(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Realtor>, BackendError>;

    async fn create_realtor(
        &self,
        tenant: &TenantId,
        realtor: &Realtor,
    ) -> Result<Realtor, BackendError>;

    async fn update_realtor(
        &self,
        tenant: &TenantId,
        id: &str,
        realtor: &Realtor,
    ) -> Result<Option<Realtor>, BackendError>;

    async fn delete_realtor(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError>;

    async fn list_enterprises(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Enterprise>, BackendError>;

    async fn create_enterprise(
        &self,
        tenant: &TenantId,
        enterprise: &Enterprise,
    ) -> Result<Enterprise, BackendError>;

    async fn update_enterprise(
        &self,
        tenant: &TenantId,
        id: &str,
        enterprise: &Enterprise,
    ) -> Result<Option<Enterprise>, BackendError>;

    async fn delete_enterprise(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError>;

    async fn list_clients(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Client>, BackendError>;

    async fn create_client(
        &self,
        tenant: &TenantId,
        client: &Client,
    ) -> Result<Client, BackendError>;

    async fn update_client(
        &self,
        tenant: &TenantId,
        id: &str,
        client: &Client,
    ) -> Result<Option<Client>, BackendError>;

    async fn delete_client(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError>;

    async fn list_agencies(&self) -> Result<Vec<Agency>, BackendError>;

    async fn create_agency(&self, agency: &Agency) -> Result<Agency, BackendError>;

    async fn update_agency(
        &self,
        id: &TenantId,
        agency: &Agency,
    ) -> Result<Option<Agency>, BackendError>;

    async fn list_plans(&self) -> Result<Vec<Plan>, BackendError>;

    async fn update_plan(&self, id: &str, plan: &Plan) -> Result<Option<Plan>, BackendError>;
}
