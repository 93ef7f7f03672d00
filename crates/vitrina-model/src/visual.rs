use crate::tenant::ValidationError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_COLOR: &str = "#1f2937";
pub const DEFAULT_SECONDARY_COLOR: &str = "#f59e0b";
pub const DEFAULT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_LOGO_URL: &str = "/assets/platform-logo.svg";

/// Per-tenant branding. A failed fetch always falls back to
/// [`VisualConfig::platform_default`], never to an error page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisualConfig {
    pub logo_url: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
}

impl VisualConfig {
    pub fn new(
        logo_url: &str,
        primary_color: &str,
        secondary_color: &str,
        font_family: &str,
    ) -> Result<Self, ValidationError> {
        validate_hex_color(primary_color)?;
        validate_hex_color(secondary_color)?;
        let font = font_family.trim();
        if font.is_empty() {
            return Err(ValidationError("font family must not be empty".to_string()));
        }
        let logo = logo_url.trim();
        if logo.is_empty() {
            return Err(ValidationError("logo url must not be empty".to_string()));
        }
        Ok(Self {
            logo_url: logo.to_string(),
            primary_color: primary_color.to_ascii_lowercase(),
            secondary_color: secondary_color.to_ascii_lowercase(),
            font_family: font.to_string(),
        })
    }

    #[must_use]
    pub fn platform_default() -> Self {
        Self {
            logo_url: DEFAULT_LOGO_URL.to_string(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }

    /// Re-validates a config deserialized from the backend; invalid records
    /// are treated the same as a failed fetch by callers.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_hex_color(&self.primary_color)?;
        validate_hex_color(&self.secondary_color)?;
        if self.font_family.trim().is_empty() {
            return Err(ValidationError("font family must not be empty".to_string()));
        }
        if self.logo_url.trim().is_empty() {
            return Err(ValidationError("logo url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn validate_hex_color(input: &str) -> Result<(), ValidationError> {
    let s = input.trim();
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| ValidationError(format!("color must start with '#': {s}")))?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError(format!("color must be #rrggbb: {s}")));
    }
    Ok(())
}
