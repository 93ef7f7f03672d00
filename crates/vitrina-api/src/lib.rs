#![forbid(unsafe_code)]

mod errors;
pub mod params;

pub use errors::{ApiError, ApiErrorCode};

pub const CRATE_NAME: &str = "vitrina-api";

/// Request header carrying the resolved tenant id, injected by the gateway
/// middleware and consumed by downstream handlers and the backend client.
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const TENANT_SLUG_HEADER: &str = "x-tenant-slug";
/// Header the backend expects on every tenant-scoped CRUD call.
pub const AGENCY_ID_HEADER: &str = "x-agency-id";

pub const TENANT_COOKIE: &str = "__tenant__";
pub const DEV_DOMAIN_COOKIE: &str = "__dev_domain__";
pub const SESSION_COOKIE: &str = "__session__";
