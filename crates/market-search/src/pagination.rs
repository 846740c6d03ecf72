//! Page windows and pagination controls.

use serde::{Deserialize, Serialize};

use crate::compiler::RowRange;

/// Results per page on the storefront.
pub const PAGE_SIZE: u32 = 12;

/// One page of a result set, before the total is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
}

impl PageWindow {
    /// Page numbers and sizes below 1 are treated as 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Zero-based index of the first row.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    /// Inclusive row range `(page-1)*size ..= page*size - 1`.
    pub fn range(&self) -> RowRange {
        let start = self.offset();
        RowRange {
            start,
            end: start + self.page_size as u64 - 1,
        }
    }
}

/// Pagination info for a fetched page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// Current page (1-indexed).
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
    /// Total number of matching items.
    pub total: u64,
    /// Total number of pages (at least 1).
    pub total_pages: u64,
    /// `total > page * page_size`.
    pub has_more: bool,
    /// Whether there's a previous page.
    pub has_previous: bool,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let window = PageWindow::new(page, page_size);
        let size = window.page_size as u64;
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(size)
        };

        Self {
            page: window.page,
            page_size: window.page_size,
            total,
            total_pages,
            has_more: total > window.page as u64 * size,
            has_previous: window.page > 1,
        }
    }

    /// Get start item number (1-indexed), 0 when nothing matched.
    pub fn start_item(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            ((self.page as u64 - 1) * self.page_size as u64 + 1).min(self.total)
        }
    }

    /// Get end item number.
    pub fn end_item(&self) -> u64 {
        (self.page as u64 * self.page_size as u64).min(self.total)
    }

    /// Page numbers for display (e.g., [3, 4, 5, 6, 7]).
    pub fn page_numbers(&self, max_visible: usize) -> Vec<u64> {
        if max_visible == 0 {
            return Vec::new();
        }
        if self.total_pages as usize <= max_visible {
            return (1..=self.total_pages).collect();
        }

        let visible = max_visible as u64;
        let half = visible / 2;
        let start = (self.page as u64).saturating_sub(half).max(1);
        let end = (start + visible - 1).min(self.total_pages);
        let start = (end + 1).saturating_sub(visible).max(1);

        (start..=end).collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, PAGE_SIZE, 0)
    }
}
