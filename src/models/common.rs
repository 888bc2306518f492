//! Shared list types
//!
//! Pagination parameters and the paginated result container used by the admin
//! listings.

use serde::{Deserialize, Serialize};

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 0;
        }
        ((self.total as u64 + self.per_page as u64 - 1) / self.per_page as u64) as u32
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn per_page_always_in_bounds(page in 0u32..10_000, per_page in 0u32..10_000) {
            let params = ListParams::new(page, per_page);
            prop_assert!(params.page >= 1);
            prop_assert!((1..=100).contains(&params.per_page));
            prop_assert!(params.offset() >= 0);
        }

        #[test]
        fn total_pages_covers_every_item(total in 0i64..100_000, per_page in 1u32..=100) {
            let params = ListParams::new(1, per_page);
            let result: PagedResult<()> = PagedResult::new(vec![], total, &params);
            let pages = result.total_pages() as i64;
            prop_assert!(pages * per_page as i64 >= total);
            prop_assert!(pages == 0 || (pages - 1) * (per_page as i64) < total);
        }
    }
}
