//! Shared DTO types used across multiple endpoints.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::GatewayError;

/// Pagination parameters for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

/// Default page number.
pub(crate) const fn default_page() -> u32 {
    1
}

/// Default page size.
pub(crate) const fn default_per_page() -> u32 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Cuts one page out of `items`, returning it with its metadata.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationMeta) {
        let Self { page, per_page } = self.clamped();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        let start =
            usize::try_from(u64::from(page - 1) * u64::from(per_page)).unwrap_or(usize::MAX);
        let data = items
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        (
            data,
            PaginationMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        )
    }
}

/// Unwraps a required request field.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] naming `field` if it is absent.
pub fn required<T>(field: &str, value: Option<T>) -> Result<T, GatewayError> {
    value.ok_or_else(|| GatewayError::Validation(format!("{field} is required")))
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] naming `field` on a malformed date.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, GatewayError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| GatewayError::Validation(format!("{field} must be a YYYY-MM-DD date")))
}
