//! Page-number pagination for feeds.

use std::num::IntErrorKind;

use serde::Serialize;

/// Number of posts on every feed page.
pub const PAGE_SIZE: u64 = 10;

/// Splits `count` items into fixed-size, 1-indexed pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    /// Create a paginator. A `per_page` of zero is treated as one.
    #[must_use]
    pub const fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: if per_page == 0 { 1 } else { per_page },
        }
    }

    /// Total number of items.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Number of pages. An empty listing still has one (empty) page.
    #[must_use]
    pub const fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `?page=` value to a valid page number.
    ///
    /// Missing or non-numeric input yields page 1; numbers below 1 clamp to
    /// page 1 and numbers past the end clamp to the last page.
    #[must_use]
    pub fn clamp(&self, raw: Option<&str>) -> u64 {
        let Some(raw) = raw else {
            return 1;
        };

        match raw.trim().parse::<i64>() {
            Ok(requested) if requested < 1 => 1,
            Ok(requested) => (requested as u64).min(self.num_pages()),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => self.num_pages(),
            Err(_) => 1,
        }
    }

    /// Offset of the first item on `number`.
    #[must_use]
    pub const fn offset(&self, number: u64) -> u64 {
        (number.saturating_sub(1)) * self.per_page
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Wrap fetched items as page `number`.
    #[must_use]
    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            items,
            number,
            num_pages,
            count: self.count,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: (number < num_pages).then_some(number + 1),
            previous_page_number: (number > 1).then(|| number - 1),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl<T> Page<T> {
    /// Convert the items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_pages() {
        assert_eq!(Paginator::new(0, PAGE_SIZE).num_pages(), 1);
        assert_eq!(Paginator::new(10, PAGE_SIZE).num_pages(), 1);
        assert_eq!(Paginator::new(11, PAGE_SIZE).num_pages(), 2);
        assert_eq!(Paginator::new(13, PAGE_SIZE).num_pages(), 2);
    }

    #[test]
    fn test_clamp_garbage_and_low_values() {
        let paginator = Paginator::new(13, PAGE_SIZE);
        assert_eq!(paginator.clamp(None), 1);
        assert_eq!(paginator.clamp(Some("abc")), 1);
        assert_eq!(paginator.clamp(Some("")), 1);
        assert_eq!(paginator.clamp(Some("0")), 1);
        assert_eq!(paginator.clamp(Some("-4")), 1);
    }

    #[test]
    fn test_clamp_past_end() {
        let paginator = Paginator::new(13, PAGE_SIZE);
        assert_eq!(paginator.clamp(Some("2")), 2);
        assert_eq!(paginator.clamp(Some("3")), 2);
        assert_eq!(paginator.clamp(Some("99999999999999999999")), 2);
        assert_eq!(paginator.clamp(Some("-99999999999999999999")), 1);
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let paginator = Paginator::new(0, PAGE_SIZE);
        assert_eq!(paginator.clamp(Some("5")), 1);

        let page = paginator.page::<u8>(1, vec![]);
        assert!(!page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.num_pages, 1);
    }

    #[test]
    fn test_page_links() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        assert_eq!(paginator.offset(3), 20);

        let page = paginator.page(2, vec![1, 2, 3]);
        assert_eq!(page.previous_page_number, Some(1));
        assert_eq!(page.next_page_number, Some(3));

        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4, 6]);
        assert_eq!(doubled.number, 2);
    }
}
