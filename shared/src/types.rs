//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Offset into the result set for this page
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_offset_starts_at_zero() {
        let p = Pagination::default();
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn pagination_offset_for_later_pages() {
        let p = Pagination {
            page: 3,
            per_page: 25,
        };
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn pagination_page_zero_treated_as_first() {
        let p = Pagination {
            page: 0,
            per_page: 10,
        };
        assert_eq!(p.offset(), 0);
    }
}
