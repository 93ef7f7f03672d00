use crate::backend::{BackendApi, Page};
use crate::BackendError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::instrument;
use vitrina_api::params::{ListingFilter, PageParams};
use vitrina_api::AGENCY_ID_HEADER;
use vitrina_model::{
    Agency, Client, Enterprise, Hostname, Plan, Property, Realtor, Tenant, TenantId, VisualConfig,
};

/// The original front-end configures its data layer with `retry: 1`, so the
/// default here is two attempts total for reads. Mutations are never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_backoff_ms: 200,
        }
    }
}

pub struct HttpBackend {
    base_url: String,
    auth_bearer: Option<String>,
    retry: RetryPolicy,
    request_timeout: Duration,
    allow_private_hosts: bool,
}

impl HttpBackend {
    #[must_use]
    pub fn new(
        base_url: String,
        auth_bearer: Option<String>,
        retry: RetryPolicy,
        request_timeout: Duration,
        allow_private_hosts: bool,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_bearer,
            retry,
            request_timeout,
            allow_private_hosts,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }

    fn validate_url(&self, url: &str) -> Result<(), BackendError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| BackendError(format!("invalid backend url: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| BackendError("backend url missing host".to_string()))?
            .to_ascii_lowercase();
        if !self.allow_private_hosts && (host == "localhost" || host.ends_with(".localhost")) {
            return Err(BackendError("blocked backend host: localhost".to_string()));
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            let private = match ip {
                IpAddr::V4(v4) => {
                    v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_broadcast()
                }
                IpAddr::V6(v6) => {
                    // fc00::/7 unique-local range.
                    v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xfe00) == 0xfc00
                }
            };
            if private && !self.allow_private_hosts {
                return Err(BackendError("blocked private backend host".to_string()));
            }
        }
        Ok(())
    }

    fn headers(&self, tenant: Option<&TenantId>) -> Result<HeaderMap, BackendError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| BackendError(format!("invalid auth header: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(tenant) = tenant {
            let value = HeaderValue::from_str(tenant.as_str())
                .map_err(|e| BackendError(format!("invalid agency header: {e}")))?;
            headers.insert(AGENCY_ID_HEADER, value);
        }
        Ok(headers)
    }

    /// GET with the read retry policy. A backend 404 is `Ok(None)`.
    #[instrument(name = "backend_get_with_retry", skip(self, query))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        tenant: Option<&TenantId>,
    ) -> Result<Option<T>, BackendError> {
        self.validate_url(url)?;
        let client = self.client();
        let headers = self.headers(tenant)?;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let req = client.get(url).headers(headers.clone()).query(query);
            match req.send().await {
                Ok(resp) if resp.status() == StatusCode::NOT_FOUND => return Ok(None),
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<T>()
                        .await
                        .map(Some)
                        .map_err(|e| BackendError(format!("response parse failed: {e}")));
                }
                Ok(resp) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(BackendError(format!(
                            "backend request failed status={} url={url}",
                            resp.status()
                        )));
                    }
                }
                Err(e) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(BackendError(format!(
                            "backend request failed url={url}: {e}"
                        )));
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(
                self.retry.base_backoff_ms.saturating_mul(attempt as u64),
            ))
            .await;
        }
    }

    /// Single-attempt mutation. A backend 404 is `Ok(None)`.
    #[instrument(name = "backend_send_json", skip(self, body))]
    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        tenant: Option<&TenantId>,
        body: &B,
    ) -> Result<Option<T>, BackendError> {
        self.validate_url(url)?;
        let client = self.client();
        let headers = self.headers(tenant)?;
        let resp = client
            .request(method, url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError(format!("backend request failed url={url}: {e}")))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => resp
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| BackendError(format!("response parse failed: {e}"))),
            status => Err(BackendError(format!(
                "backend request failed status={status} url={url}"
            ))),
        }
    }

    #[instrument(name = "backend_delete", skip(self))]
    async fn delete(&self, url: &str, tenant: &TenantId) -> Result<bool, BackendError> {
        self.validate_url(url)?;
        let client = self.client();
        let headers = self.headers(Some(tenant))?;
        let resp = client
            .delete(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| BackendError(format!("backend request failed url={url}: {e}")))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(BackendError(format!(
                "backend request failed status={status} url={url}"
            ))),
        }
    }

    fn page_query(filter: Option<&ListingFilter>, page: &PageParams) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", page.page.to_string()),
            ("per_page", page.per_page.to_string()),
        ];
        if let Some(filter) = filter {
            if let Some(city) = &filter.city {
                query.push(("city", city.clone()));
            }
            if let Some(featured) = filter.featured {
                query.push(("featured", featured.to_string()));
            }
            if let Some(published) = filter.published {
                query.push(("published", published.to_string()));
            }
        }
        query
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn resolve_tenant(&self, hostname: &Hostname) -> Result<Option<Tenant>, BackendError> {
        let url = self.url("/resolve-tenant");
        self.get_json(&url, &[("hostname", hostname.as_str().to_string())], None)
            .await
    }

    async fn fetch_visual_config(&self, tenant: &TenantId) -> Result<VisualConfig, BackendError> {
        let url = self.url(&format!("/agencies/{}/visual-config", tenant.as_str()));
        self.get_json(&url, &[], Some(tenant))
            .await?
            .ok_or_else(|| BackendError("visual config missing for agency".to_string()))
    }

    async fn fetch_plan(&self, tenant: &TenantId) -> Result<Plan, BackendError> {
        let url = self.url(&format!("/agencies/{}/plan", tenant.as_str()));
        self.get_json(&url, &[], Some(tenant))
            .await?
            .ok_or_else(|| BackendError("plan missing for agency".to_string()))
    }

    async fn list_properties(
        &self,
        tenant: &TenantId,
        filter: &ListingFilter,
        page: &PageParams,
    ) -> Result<Page<Property>, BackendError> {
        let url = self.url("/properties");
        let query = Self::page_query(Some(filter), page);
        Ok(self
            .get_json(&url, &query, Some(tenant))
            .await?
            .unwrap_or_else(Page::empty))
    }

    async fn get_property(
        &self,
        tenant: &TenantId,
        id: &str,
    ) -> Result<Option<Property>, BackendError> {
        let url = self.url(&format!("/properties/{id}"));
        self.get_json(&url, &[], Some(tenant)).await
    }

    async fn create_property(
        &self,
        tenant: &TenantId,
        property: &Property,
    ) -> Result<Property, BackendError> {
        let url = self.url("/properties");
        self.send_json(Method::POST, &url, Some(tenant), property)
            .await?
            .ok_or_else(|| BackendError("backend rejected property create".to_string()))
    }

    async fn update_property(
        &self,
        tenant: &TenantId,
        id: &str,
        property: &Property,
    ) -> Result<Option<Property>, BackendError> {
        let url = self.url(&format!("/properties/{id}"));
        self.send_json(Method::PUT, &url, Some(tenant), property)
            .await
    }

    async fn delete_property(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError> {
        let url = self.url(&format!("/properties/{id}"));
        self.delete(&url, tenant).await
    }

    async fn list_realtors(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Realtor>, BackendError> {
        let url = self.url("/realtors");
        let query = Self::page_query(None, page);
        Ok(self
            .get_json(&url, &query, Some(tenant))
            .await?
            .unwrap_or_else(Page::empty))
    }

    async fn create_realtor(
        &self,
        tenant: &TenantId,
        realtor: &Realtor,
    ) -> Result<Realtor, BackendError> {
        let url = self.url("/realtors");
        self.send_json(Method::POST, &url, Some(tenant), realtor)
            .await?
            .ok_or_else(|| BackendError("backend rejected realtor create".to_string()))
    }

    async fn update_realtor(
        &self,
        tenant: &TenantId,
        id: &str,
        realtor: &Realtor,
    ) -> Result<Option<Realtor>, BackendError> {
        let url = self.url(&format!("/realtors/{id}"));
        self.send_json(Method::PUT, &url, Some(tenant), realtor)
            .await
    }

    async fn delete_realtor(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError> {
        let url = self.url(&format!("/realtors/{id}"));
        self.delete(&url, tenant).await
    }

    async fn list_enterprises(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Enterprise>, BackendError> {
        let url = self.url("/enterprises");
        let query = Self::page_query(None, page);
        Ok(self
            .get_json(&url, &query, Some(tenant))
            .await?
            .unwrap_or_else(Page::empty))
    }

    async fn create_enterprise(
        &self,
        tenant: &TenantId,
        enterprise: &Enterprise,
    ) -> Result<Enterprise, BackendError> {
        let url = self.url("/enterprises");
        self.send_json(Method::POST, &url, Some(tenant), enterprise)
            .await?
            .ok_or_else(|| BackendError("backend rejected enterprise create".to_string()))
    }

    async fn update_enterprise(
        &self,
        tenant: &TenantId,
        id: &str,
        enterprise: &Enterprise,
    ) -> Result<Option<Enterprise>, BackendError> {
        let url = self.url(&format!("/enterprises/{id}"));
        self.send_json(Method::PUT, &url, Some(tenant), enterprise)
            .await
    }

    async fn delete_enterprise(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError> {
        let url = self.url(&format!("/enterprises/{id}"));
        self.delete(&url, tenant).await
    }

    async fn list_clients(
        &self,
        tenant: &TenantId,
        page: &PageParams,
    ) -> Result<Page<Client>, BackendError> {
        let url = self.url("/clients");
        let query = Self::page_query(None, page);
        Ok(self
            .get_json(&url, &query, Some(tenant))
            .await?
            .unwrap_or_else(Page::empty))
    }

    async fn create_client(
        &self,
        tenant: &TenantId,
        client: &Client,
    ) -> Result<Client, BackendError> {
        let url = self.url("/clients");
        self.send_json(Method::POST, &url, Some(tenant), client)
            .await?
            .ok_or_else(|| BackendError("backend rejected client create".to_string()))
    }

    async fn update_client(
        &self,
        tenant: &TenantId,
        id: &str,
        client: &Client,
    ) -> Result<Option<Client>, BackendError> {
        let url = self.url(&format!("/clients/{id}"));
        self.send_json(Method::PUT, &url, Some(tenant), client)
            .await
    }

    async fn delete_client(&self, tenant: &TenantId, id: &str) -> Result<bool, BackendError> {
        let url = self.url(&format!("/clients/{id}"));
        self.delete(&url, tenant).await
    }

    async fn list_agencies(&self) -> Result<Vec<Agency>, BackendError> {
        let url = self.url("/agencies");
        self.get_json(&url, &[], None)
            .await?
            .ok_or_else(|| BackendError("agency listing missing".to_string()))
    }

    async fn create_agency(&self, agency: &Agency) -> Result<Agency, BackendError> {
        let url = self.url("/agencies");
        self.send_json(Method::POST, &url, None, agency)
            .await?
            .ok_or_else(|| BackendError("backend rejected agency create".to_string()))
    }

    async fn update_agency(
        &self,
        id: &TenantId,
        agency: &Agency,
    ) -> Result<Option<Agency>, BackendError> {
        let url = self.url(&format!("/agencies/{}", id.as_str()));
        self.send_json(Method::PUT, &url, None, agency).await
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, BackendError> {
        let url = self.url("/plans");
        self.get_json(&url, &[], None)
            .await?
            .ok_or_else(|| BackendError("plan listing missing".to_string()))
    }

    async fn update_plan(&self, id: &str, plan: &Plan) -> Result<Option<Plan>, BackendError> {
        let url = self.url(&format!("/plans/{id}"));
        self.send_json(Method::PUT, &url, None, plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(allow_private: bool) -> HttpBackend {
        HttpBackend::new(
            "https://api.vitrina.app/".to_string(),
            Some("token".to_string()),
            RetryPolicy::default(),
            Duration::from_secs(2),
            allow_private,
        )
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let b = backend(false);
        assert_eq!(b.url("/resolve-tenant"), "https://api.vitrina.app/resolve-tenant");
    }

    #[test]
    fn private_hosts_are_blocked_unless_allowed() {
        let b = backend(false);
        assert!(b.validate_url("http://127.0.0.1:9000/x").is_err());
        assert!(b.validate_url("http://10.0.0.8/x").is_err());
        assert!(b.validate_url("http://api.localhost/x").is_err());
        assert!(b.validate_url("https://api.vitrina.app/x").is_ok());

        let open = backend(true);
        assert!(open.validate_url("http://127.0.0.1:9000/x").is_ok());
    }

    #[test]
    fn tenant_scoped_calls_carry_the_agency_header() {
        let b = backend(false);
        let tenant = vitrina_model::parse_tenant_id("ag-1").expect("tenant id");
        let headers = b.headers(Some(&tenant)).expect("headers");
        assert_eq!(
            headers.get(AGENCY_ID_HEADER).and_then(|v| v.to_str().ok()),
            Some("ag-1")
        );
        assert!(headers.get(AUTHORIZATION).is_some());

        let unscoped = b.headers(None).expect("headers");
        assert!(unscoped.get(AGENCY_ID_HEADER).is_none());
    }

    #[test]
    fn page_query_includes_only_set_filters() {
        let page = PageParams {
            page: 2,
            per_page: 10,
        };
        let filter = ListingFilter {
            city: Some("Curitiba".to_string()),
            featured: Some(true),
            published: None,
        };
        let query = HttpBackend::page_query(Some(&filter), &page);
        assert!(query.contains(&("city", "Curitiba".to_string())));
        assert!(query.contains(&("featured", "true".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "published"));
    }
}
