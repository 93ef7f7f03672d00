#![forbid(unsafe_code)]
//! Vitrina model SSOT.
//!
//! Every record that crosses the gateway boundary is defined here and
//! validated at construction; the backend API owns persistence and the
//! rest of each record's lifecycle.

mod listing;
mod plan;
mod tenant;
mod visual;

pub use listing::{
    validate_client, validate_enterprise, validate_property, validate_realtor, Client, Enterprise,
    FieldError, ListingValidationReport, Property, Realtor, NAME_MAX_LEN, TITLE_MAX_LEN,
};
pub use plan::{Feature, Plan, PlanTier};
pub use tenant::{
    parse_hostname, parse_tenant_id, parse_tenant_slug, Agency, Hostname, Tenant, TenantId,
    TenantSlug, ValidationError, HOSTNAME_MAX_LEN, TENANT_ID_MAX_LEN, TENANT_SLUG_MAX_LEN,
};
pub use visual::{VisualConfig, DEFAULT_FONT_FAMILY, DEFAULT_PRIMARY_COLOR};
