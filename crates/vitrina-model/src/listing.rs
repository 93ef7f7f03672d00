use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};

pub const TITLE_MAX_LEN: usize = 160;
pub const NAME_MAX_LEN: usize = 120;

/// Field-level validation outcome for records edited through the back-office.
/// The backend re-validates on persist; the gateway rejects what it can see
/// before forwarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingValidationReport {
    pub field_errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl ListingValidationReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.field_errors.is_empty()
    }

    fn push(&mut self, field: &str, reason: &str) {
        self.field_errors.push(FieldError {
            field: field.to_string(),
            reason: reason.to_string(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub agency_id: Option<TenantId>,
    pub title: String,
    pub price_cents: i64,
    pub city: String,
    pub realtor_id: Option<String>,
    pub enterprise_id: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realtor {
    pub id: String,
    pub agency_id: Option<TenantId>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub creci: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enterprise {
    pub id: String,
    pub agency_id: Option<TenantId>,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub unit_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub agency_id: Option<TenantId>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[must_use]
pub fn validate_property(p: &Property) -> ListingValidationReport {
    let mut report = ListingValidationReport::default();
    let title = p.title.trim();
    if title.is_empty() {
        report.push("title", "must not be empty");
    }
    if title.len() > TITLE_MAX_LEN {
        report.push("title", "exceeds max length");
    }
    if p.price_cents < 0 {
        report.push("price_cents", "must not be negative");
    }
    if p.city.trim().is_empty() {
        report.push("city", "must not be empty");
    }
    report
}

#[must_use]
pub fn validate_realtor(r: &Realtor) -> ListingValidationReport {
    let mut report = ListingValidationReport::default();
    validate_person_name(&mut report, &r.name);
    validate_email(&mut report, &r.email);
    report
}

#[must_use]
pub fn validate_enterprise(e: &Enterprise) -> ListingValidationReport {
    let mut report = ListingValidationReport::default();
    if e.name.trim().is_empty() {
        report.push("name", "must not be empty");
    }
    if e.city.trim().is_empty() {
        report.push("city", "must not be empty");
    }
    report
}

#[must_use]
pub fn validate_client(c: &Client) -> ListingValidationReport {
    let mut report = ListingValidationReport::default();
    validate_person_name(&mut report, &c.name);
    validate_email(&mut report, &c.email);
    report
}

fn validate_person_name(report: &mut ListingValidationReport, name: &str) {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        report.push("name", "must not be empty");
    }
    if trimmed.len() > NAME_MAX_LEN {
        report.push("name", "exceeds max length");
    }
}

fn validate_email(report: &mut ListingValidationReport, email: &str) {
    let trimmed = email.trim();
    let well_formed = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        report.push("email", "must be a well-formed address");
    }
}
