use crate::errors::ApiError;
use std::collections::BTreeMap;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: usize,
    pub per_page: usize,
}

impl PageParams {
    /// Saturates rather than overflowing: `page` is only bounds-checked
    /// against zero at parse time, so arbitrarily large pages must degrade
    /// to an empty tail page instead of panicking.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub city: Option<String>,
    pub featured: Option<bool>,
    pub published: Option<bool>,
}

pub fn parse_page_params(query: &BTreeMap<String, String>) -> Result<PageParams, ApiError> {
    let page = match query.get("page") {
        Some(raw) => {
            let value = raw
                .parse::<usize>()
                .map_err(|_| ApiError::invalid_param("page", raw))?;
            if value == 0 {
                return Err(ApiError::invalid_param("page", raw));
            }
            value
        }
        None => 1,
    };
    let per_page = match query.get("per_page") {
        Some(raw) => {
            let value = raw
                .parse::<usize>()
                .map_err(|_| ApiError::invalid_param("per_page", raw))?;
            if value == 0 || value > MAX_PER_PAGE {
                return Err(ApiError::invalid_param("per_page", raw));
            }
            value
        }
        None => DEFAULT_PER_PAGE,
    };
    Ok(PageParams { page, per_page })
}

pub fn parse_listing_filter(query: &BTreeMap<String, String>) -> Result<ListingFilter, ApiError> {
    let city = match query.get("city") {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ApiError::invalid_param("city", raw));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };
    Ok(ListingFilter {
        city,
        featured: parse_bool_param(query, "featured")?,
        published: parse_bool_param(query, "published")?,
    })
}

fn parse_bool_param(
    query: &BTreeMap<String, String>,
    name: &str,
) -> Result<Option<bool>, ApiError> {
    match query.get(name).map(String::as_str) {
        None => Ok(None),
        Some("1" | "true") => Ok(Some(true)),
        Some("0" | "false") => Ok(Some(false)),
        Some(other) => Err(ApiError::invalid_param(name, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_params_absent() {
        let p = parse_page_params(&query(&[])).expect("params");
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, DEFAULT_PER_PAGE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn per_page_is_capped() {
        assert!(parse_page_params(&query(&[("per_page", "101")])).is_err());
        assert!(parse_page_params(&query(&[("per_page", "0")])).is_err());
        let p = parse_page_params(&query(&[("page", "3"), ("per_page", "50")])).expect("params");
        assert_eq!(p.offset(), 100);
    }

    #[test]
    fn huge_page_numbers_saturate_instead_of_overflowing() {
        let raw = usize::MAX.to_string();
        let p = parse_page_params(&query(&[("page", raw.as_str())])).expect("params");
        assert_eq!(p.page, usize::MAX);
        assert_eq!(p.offset(), usize::MAX);
    }

    #[test]
    fn bool_filters_accept_both_spellings() {
        let f = parse_listing_filter(&query(&[("featured", "1"), ("published", "false")]))
            .expect("filter");
        assert_eq!(f.featured, Some(true));
        assert_eq!(f.published, Some(false));
        assert!(parse_listing_filter(&query(&[("featured", "yep")])).is_err());
    }

    #[test]
    fn blank_city_is_rejected() {
        assert!(parse_listing_filter(&query(&[("city", "  ")])).is_err());
    }
}
