//! Pagination utilities for listing endpoints

use cmc_common::api::Paginated;
use serde::Deserialize;

/// Page size when the client does not ask for one
pub const DEFAULT_PER_PAGE: i64 = 25;

/// Largest page size a client may request
pub const MAX_PER_PAGE: i64 = 100;

/// `?page=&per_page=` query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page after clamping
    pub per_page: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

impl Pagination {
    /// Wrap one page of rows with its metadata
    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Paginated<T> {
        Paginated {
            items,
            total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Calculate pagination metadata from total results and requested page
///
/// Page is clamped to `[1, max(total_pages, 1)]`, page size to `[1, 100]`.
///
/// # Examples
/// ```
/// use cmc_hr::pagination::calculate_pagination;
///
/// // 60 results at 25 per page = 3 pages (25 + 25 + 10)
/// let p = calculate_pagination(60, 2, 25);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 25);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(60, 99, 25);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 50);
/// ```
pub fn calculate_pagination(total_results: i64, requested_page: i64, per_page: i64) -> Pagination {
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let total_pages = (total_results.max(0) + per_page - 1) / per_page;
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * per_page;

    Pagination {
        page,
        per_page,
        total_pages,
        offset,
    }
}

impl PageQuery {
    pub fn paginate(&self, total_results: i64) -> Pagination {
        calculate_pagination(total_results, self.page, self.per_page)
    }
}
