// src/query/page.rs

//! Client-side pagination over an already filtered and sorted sequence.

use std::ops::Range;

/// Which slice of the sequence a page covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub current_page: usize,
    pub total_pages: usize,
    pub range: Range<usize>,
}

/// Window for `page` (1-based), clamped into `1..=max(total_pages, 1)`.
pub fn window(total_count: usize, page: usize, page_size: usize) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = total_count.div_ceil(page_size);
    let current_page = page.clamp(1, total_pages.max(1));

    let start = ((current_page - 1) * page_size).min(total_count);
    let end = (start + page_size).min(total_count);

    PageWindow {
        current_page,
        total_pages,
        range: start..end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(window(25, 1, 10).total_pages, 3);
        assert_eq!(window(20, 1, 10).total_pages, 2);
        assert_eq!(window(0, 1, 10).total_pages, 0);
    }

    #[test]
    fn test_last_page_is_partial() {
        let last = window(25, 3, 10);
        assert_eq!(last.range, 20..25);
    }

    #[test]
    fn test_out_of_range_clamps() {
        assert_eq!(window(25, 9, 10).current_page, 3);
        assert_eq!(window(25, 0, 10).current_page, 1);
        let empty = window(0, 4, 10);
        assert_eq!(empty.current_page, 1);
        assert!(empty.range.is_empty());
    }

    #[test]
    fn test_zero_page_size_treated_as_one() {
        let w = window(3, 2, 0);
        assert_eq!(w.total_pages, 3);
        assert_eq!(w.range, 1..2);
    }
}
