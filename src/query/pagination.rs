//! Page arithmetic and the pager's page-number window.

/// Default number of page buttons shown at once.
pub const DEFAULT_PAGE_WINDOW: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based, always within `[1, total_pages()]` once clamped.
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total_count: 0,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    /// Clamp an arbitrary requested page into `[1, total_pages]`.
    pub fn clamp(&self, requested: i64) -> u32 {
        let total = i64::from(self.total_pages());
        // total >= 1, so the clamp bounds are ordered.
        requested.clamp(1, total) as u32
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn window(&self, width: u32) -> PageWindow {
        page_window(self.page, self.total_pages(), width)
    }
}

/// `max(1, ceil(total_count / page_size))`.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Parse a `page` query parameter. Absent, non-numeric or < 1 means page 1.
pub fn parse_page_param(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// PageWindow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u32,
    pub end: u32,
    pub leading_ellipsis: bool,
    pub trailing_ellipsis: bool,
}

impl PageWindow {
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.pages().collect()
    }
}

/// Centered window of at most `width` page numbers around `page`.
pub fn page_window(page: u32, total_pages: u32, width: u32) -> PageWindow {
    let total = total_pages.max(1);
    let width = width.max(1);
    let page = page.clamp(1, total);

    let start = page.saturating_sub(width / 2).max(1);
    let end = total.min(start + width - 1);
    let start = end.saturating_sub(width - 1).max(1);

    PageWindow {
        start,
        end,
        leading_ellipsis: start > 1,
        trailing_ellipsis: end < total,
    }
}
