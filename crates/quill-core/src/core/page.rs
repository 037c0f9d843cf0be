// crates/quill-core/src/core/page.rs
// ============================================================================
// Module: Quill Pagination
// Description: Page request resolution and page result assembly.
// Purpose: Clamp client paging input and compute the next page marker.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Listing is offset-based. Client input is clamped rather than rejected:
//! missing or non-positive values fall back to 1, page sizes are capped at
//! the configured maximum, and the next page marker is only present while
//! rows remain past the current window.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::post::Post;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of posts per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Default upper bound on posts per page.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Paging defaults and bounds.
///
/// # Invariants
/// - `1 <= default_page_size <= max_page_size` (enforced by config validation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Page size used when the client omits one.
    pub default_page_size: u32,
    /// Largest page size honored.
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

// ============================================================================
// SECTION: Page Request
// ============================================================================

/// Resolved page window.
///
/// # Invariants
/// - `page >= 1` and `page_size >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number.
    page: u32,
    /// Posts per page.
    page_size: u32,
}

impl PageRequest {
    /// Resolves raw client values against paging limits.
    #[must_use]
    pub fn resolve(page: Option<i64>, page_size: Option<i64>, limits: &PageLimits) -> Self {
        let page = page.map_or(1, clamp_positive);
        let page_size = page_size
            .map_or(limits.default_page_size, clamp_positive)
            .min(limits.max_page_size.max(1));
        Self {
            page,
            page_size,
        }
    }

    /// Returns the one-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Returns the next page number when rows remain past this window.
    #[must_use]
    pub fn next_page(&self, total: u64) -> Option<u32> {
        let end = self.offset() + u64::from(self.page_size);
        if end < total { self.page.checked_add(1) } else { None }
    }
}

/// Clamps a raw client integer into `1..=u32::MAX`.
fn clamp_positive(value: i64) -> u32 {
    u32::try_from(value.max(1)).unwrap_or(u32::MAX)
}

// ============================================================================
// SECTION: Page Result
// ============================================================================

/// One page of posts plus paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPage {
    /// Posts in listing order.
    pub posts: Vec<Post>,
    /// Total number of posts in the store.
    pub total: u64,
    /// One-based page number.
    pub page: u32,
    /// Posts per page.
    pub page_size: u32,
    /// Next page number, absent on the last page.
    pub next_page: Option<u32>,
}

impl PostPage {
    /// Assembles a page result for a resolved request.
    #[must_use]
    pub fn new(request: PageRequest, posts: Vec<Post>, total: u64) -> Self {
        Self {
            posts,
            total,
            page: request.page(),
            page_size: request.page_size(),
            next_page: request.next_page(total),
        }
    }
}
