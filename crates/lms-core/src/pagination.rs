//! Page-based pagination and sorting helpers for list endpoints.
//!
//! List endpoints accept `page` (1-indexed) and `per_page` query parameters
//! and answer with a [`PageMeta`] block:
//!
//! ```json
//! { "page": 2, "per_page": 10, "total": 57, "pages": 6 }
//! ```
//!
//! Each endpoint has its own default page size, so [`PageParams::per_page`]
//! takes the default as an argument.
//!
//! # Example
//!
//! ```ignore
//! let per_page = params.per_page(10);
//! let offset = params.offset(10);
//! let rows = fetch(per_page, offset).await?;
//! let meta = PageMeta::new(params.page(), per_page, total);
//! ```

use serde::{Deserialize, Serialize};

use crate::serde::deserialize_optional_i64;

/// Upper bound for any requested page size.
pub const MAX_PER_PAGE: i64 = 100;

/// Pagination metadata returned alongside list data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageMeta {
    #[must_use]
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page,
            per_page,
            total,
            pages,
        }
    }
}

/// Query parameters for page-based pagination.
///
/// Empty strings are treated as missing, so `?page=&per_page=` behaves like
/// no parameters at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Current page, never below 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `[1, MAX_PER_PAGE]`.
    #[must_use]
    pub fn per_page(&self, default: i64) -> i64 {
        self.per_page.unwrap_or(default).clamp(1, MAX_PER_PAGE)
    }

    #[must_use]
    pub fn offset(&self, default: i64) -> i64 {
        (self.page() - 1) * self.per_page(default)
    }
}

/// Sort direction accepted by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses `asc`/`desc` case-insensitively, falling back to `default`.
    #[must_use]
    pub fn parse_or(value: Option<&str>, default: SortOrder) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "asc" => SortOrder::Asc,
            Some(v) if v == "desc" => SortOrder::Desc,
            _ => default,
        }
    }

    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Maps a user supplied sort key onto a whitelisted SQL column.
///
/// Unknown keys resolve to `default`, so user input never reaches the query
/// text.
#[must_use]
pub fn sort_column<'a>(requested: Option<&str>, allowed: &[(&str, &'a str)], default: &'a str) -> &'a str {
    requested
        .and_then(|key| {
            allowed
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, column)| *column)
        })
        .unwrap_or(default)
}
