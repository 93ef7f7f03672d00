use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidQueryParameter,
    ValidationFailed,
    TenantNotResolved,
    FeatureNotInPlan,
    Unauthorized,
    BackendUnavailable,
    NotFound,
    RateLimited,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"field_errors":[{"parameter": name, "reason": "invalid", "value": value}]}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn validation_failed(field_errors: Value) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            "validation failed",
            json!({"field_errors": field_errors}),
            "req-unknown",
        )
    }

    /// Maps a gateway-side validation report onto the wire envelope.
    #[must_use]
    pub fn from_validation_report(report: &vitrina_model::ListingValidationReport) -> Self {
        Self::validation_failed(
            serde_json::to_value(&report.field_errors).unwrap_or_else(|_| json!([])),
        )
    }

    #[must_use]
    pub fn tenant_not_resolved(hostname: &str) -> Self {
        Self::new(
            ApiErrorCode::TenantNotResolved,
            "no tenant registered for hostname",
            json!({"hostname": hostname}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn feature_not_in_plan(feature: &str, redirect: &str) -> Self {
        Self::new(
            ApiErrorCode::FeatureNotInPlan,
            format!("plan does not include feature: {feature}"),
            json!({"feature": feature, "redirect": redirect}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn unauthorized(reason: &str) -> Self {
        Self::new(
            ApiErrorCode::Unauthorized,
            "authentication required",
            json!({"reason": reason}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn backend_unavailable(message: &str) -> Self {
        Self::new(
            ApiErrorCode::BackendUnavailable,
            "backend api unavailable",
            json!({"message": message}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn rate_limited() -> Self {
        Self::new(
            ApiErrorCode::RateLimited,
            "too many requests",
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::new(
            ApiErrorCode::NotFound,
            format!("{resource} not found"),
            json!({"resource": resource, "id": id}),
            "req-unknown",
        )
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
    assert_traits::<ApiError>();
};
