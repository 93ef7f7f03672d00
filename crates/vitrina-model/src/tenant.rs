use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const TENANT_ID_MAX_LEN: usize = 64;
pub const TENANT_SLUG_MAX_LEN: usize = 64;
pub const HOSTNAME_MAX_LEN: usize = 253;

pub fn parse_tenant_id(input: &str) -> Result<TenantId, ValidationError> {
    TenantId::parse(input)
}

pub fn parse_tenant_slug(input: &str) -> Result<TenantSlug, ValidationError> {
    TenantSlug::parse(input)
}

pub fn parse_hostname(input: &str) -> Result<Hostname, ValidationError> {
    Hostname::parse(input)
}

/// Opaque agency identifier issued by the backend API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("tenant id must not be empty".to_string()));
        }
        if s.len() > TENANT_ID_MAX_LEN {
            return Err(ValidationError(format!(
                "tenant id exceeds max length {TENANT_ID_MAX_LEN}"
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError(
                "tenant id must match [a-z0-9-]+".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// URL-safe agency slug used in the tenant cookie and branded routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct TenantSlug(String);

impl TenantSlug {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("tenant slug must not be empty".to_string()));
        }
        if s.len() > TENANT_SLUG_MAX_LEN {
            return Err(ValidationError(format!(
                "tenant slug exceeds max length {TENANT_SLUG_MAX_LEN}"
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError(
                "tenant slug must match [a-z0-9-]+".to_string(),
            ));
        }
        if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(ValidationError(
                "tenant slug must not start/end with '-' or contain '--'".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for TenantSlug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized request hostname: lowercased, port stripped, labels checked.
///
/// Normalization is idempotent; parsing an already-parsed hostname's string
/// form yields the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct Hostname(String);

impl Hostname {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError("hostname must not be empty".to_string()));
        }
        let without_port = trimmed.rsplit_once(':').map_or(trimmed, |(host, port)| {
            if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() {
                host
            } else {
                trimmed
            }
        });
        let host = without_port.trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return Err(ValidationError("hostname must not be empty".to_string()));
        }
        if host.len() > HOSTNAME_MAX_LEN {
            return Err(ValidationError(format!(
                "hostname exceeds max length {HOSTNAME_MAX_LEN}"
            )));
        }
        for label in host.split('.') {
            if label.is_empty() {
                return Err(ValidationError(
                    "hostname must not contain empty labels".to_string(),
                ));
            }
            if label.len() > 63 {
                return Err(ValidationError(
                    "hostname label exceeds 63 bytes".to_string(),
                ));
            }
            if !label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(ValidationError(
                    "hostname labels must match [a-z0-9-]+".to_string(),
                ));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(ValidationError(
                    "hostname labels must not start or end with '-'".to_string(),
                ));
            }
        }
        Ok(Self(host))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Hostname {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolution record returned by `GET /resolve-tenant?hostname=...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tenant {
    pub id: TenantId,
    pub slug: TenantSlug,
    pub name: String,
}

impl Tenant {
    pub fn new(id: &str, slug: &str, name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError("tenant name must not be empty".to_string()));
        }
        Ok(Self {
            id: parse_tenant_id(id)?,
            slug: parse_tenant_slug(slug)?,
            name: name.to_string(),
        })
    }
}

/// Full agency record managed through the super-admin surface. The public
/// resolution path only ever sees the [`Tenant`] projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Agency {
    pub id: TenantId,
    pub slug: TenantSlug,
    pub name: String,
    pub hostname: Hostname,
    pub plan_id: String,
}

impl Agency {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError("agency name must not be empty".to_string()));
        }
        if self.plan_id.trim().is_empty() {
            return Err(ValidationError("agency plan id must not be empty".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn tenant(&self) -> Tenant {
        Tenant {
            id: self.id.clone(),
            slug: self.slug.clone(),
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_strips_port_and_lowercases() {
        let h = Hostname::parse("Casas-Sol.Example.COM:3000").expect("hostname");
        assert_eq!(h.as_str(), "casas-sol.example.com");
    }

    #[test]
    fn hostname_normalization_is_idempotent() {
        let once = Hostname::parse("  Imobia.example.com.  ").expect("hostname");
        let twice = Hostname::parse(once.as_str()).expect("reparse");
        assert_eq!(once, twice);
    }

    #[test]
    fn hostname_rejects_garbage() {
        assert!(Hostname::parse("").is_err());
        assert!(Hostname::parse("exa mple.com").is_err());
        assert!(Hostname::parse("a..b").is_err());
        assert!(Hostname::parse("-bad.example.com").is_err());
        assert!(Hostname::parse(&"x".repeat(300)).is_err());
    }

    #[test]
    fn slug_rejects_double_dash_and_edges() {
        assert!(TenantSlug::parse("casas-sol").is_ok());
        assert!(TenantSlug::parse("-casas").is_err());
        assert!(TenantSlug::parse("casas-").is_err());
        assert!(TenantSlug::parse("ca--sas").is_err());
        assert!(TenantSlug::parse("Casas").is_err());
    }

    #[test]
    fn tenant_requires_nonempty_name() {
        assert!(Tenant::new("ag-1", "casas-sol", "  ").is_err());
        let t = Tenant::new("ag-1", "casas-sol", "Casas Sol").expect("tenant");
        assert_eq!(t.id.as_str(), "ag-1");
    }
}
