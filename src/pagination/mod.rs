//! Client-side pagination over an in-memory, already ordered collection.

pub mod strip;

pub use strip::{MAX_STRIP_TOKENS, PageToken, page_strip, render_strip};

use crate::core::{Error, Result};
use serde::Serialize;

/// A collection sliced into fixed-size pages with a 1-based cursor.
///
/// The cursor always satisfies `1 <= current_page() <= total_pages()`, and an
/// empty collection still has one (empty) page. Replacing the items through
/// [`Paginator::set_items`] moves the cursor back to page 1.
///
/// # Examples
///
/// ```
/// use learnify::Paginator;
///
/// let mut pages = Paginator::new(vec!['a', 'b', 'c', 'd', 'e', 'f', 'g'], 3).unwrap();
/// assert_eq!(pages.total_pages(), 3);
/// assert_eq!(pages.current_items(), &['a', 'b', 'c']);
///
/// pages.go_to_page(3);
/// assert_eq!(pages.current_items(), &['g']);
///
/// pages.next_page();
/// assert_eq!(pages.current_page(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    page_size: usize,
    current_page: usize,
}

impl<T> Paginator<T> {
    /// Fails with [`Error::InvalidArgument`] when `page_size` is zero.
    pub fn new(items: Vec<T>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::invalid_argument("page size must be greater than zero"));
        }

        Ok(Self {
            items,
            page_size,
            current_page: 1,
        })
    }

    /// Replace the backing collection and return to the first page.
    ///
    /// The reset is unconditional: even when the old page number would still
    /// be valid for the new items, it points at unrelated content.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.current_page = 1;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.items.len().div_ceil(self.page_size).max(1)
    }

    /// Items on the current page; shorter than a full page only on the last one.
    pub fn current_items(&self) -> &[T] {
        let len = self.items.len();
        let start = (self.current_page - 1).saturating_mul(self.page_size).min(len);
        let end = start.saturating_add(self.page_size).min(len);
        &self.items[start..end]
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.current_page > 1
    }

    /// Whether navigation controls are worth rendering at all.
    pub fn shows_controls(&self) -> bool {
        self.total_pages() > 1
    }

    pub fn next_page(&mut self) {
        if self.has_next_page() {
            self.current_page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.has_previous_page() {
            self.current_page -= 1;
        }
    }

    /// Jump to `page`, clamped into `[1, total_pages()]`.
    ///
    /// Out-of-range targets come from stale page buttons, so they are clamped
    /// rather than rejected.
    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages());
    }

    pub fn page_strip(&self) -> Vec<PageToken> {
        page_strip(self.total_pages(), self.current_page)
    }
}

impl<T: Clone> Paginator<T> {
    pub fn snapshot(&self) -> PageView<T> {
        PageView {
            items: self.current_items().to_vec(),
            page: self.current_page,
            page_size: self.page_size,
            total_items: self.items.len(),
            total_pages: self.total_pages(),
            has_next: self.has_next_page(),
            has_previous: self.has_previous_page(),
            strip: self.page_strip(),
        }
    }
}

/// Owned, serializable view of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub strip: Vec<PageToken>,
}
