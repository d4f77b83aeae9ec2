use super::{ListFilter, Searchable, apply_filters};
use crate::bookmark::BookmarkEngine;
use crate::core::Result;
use crate::pagination::{PageView, Paginator};
use std::collections::HashSet;

/// State behind one list page: the fetched collection, the active filter, a
/// copy of the bookmark set, and the pagination over the filtered result.
///
/// Every change to the collection, the filter or the bookmark set recomputes
/// the filtered list and sends the view back to page 1.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    raw: Vec<T>,
    filter: ListFilter,
    bookmarks: HashSet<String>,
    pages: Paginator<T>,
}

impl<T: Searchable + Clone> ListView<T> {
    pub fn new(page_size: usize) -> Result<Self> {
        Ok(Self {
            raw: Vec::new(),
            filter: ListFilter::default(),
            bookmarks: HashSet::new(),
            pages: Paginator::new(Vec::new(), page_size)?,
        })
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.raw = items;
        self.recompute();
    }

    pub fn set_filter(&mut self, filter: ListFilter) {
        self.filter = filter;
        self.recompute();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.recompute();
    }

    pub fn set_bookmarked_only(&mut self, enabled: bool) {
        self.filter.bookmarked_only = enabled;
        self.recompute();
    }

    pub fn set_owner(&mut self, owner: Option<String>) {
        self.filter.owner = owner;
        self.recompute();
    }

    pub fn set_bookmarks<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.bookmarks = ids.into_iter().collect();
        self.recompute();
    }

    /// Take a fresh copy of `engine`'s bookmark set.
    pub fn refresh_bookmarks(&mut self, engine: &BookmarkEngine) {
        self.set_bookmarks(engine.bookmarks());
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn raw_len(&self) -> usize {
        self.raw.len()
    }

    pub fn filtered_len(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &Paginator<T> {
        &self.pages
    }

    pub fn current_items(&self) -> &[T] {
        self.pages.current_items()
    }

    pub fn current_page(&self) -> usize {
        self.pages.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.pages.total_pages()
    }

    pub fn next_page(&mut self) {
        self.pages.next_page();
    }

    pub fn previous_page(&mut self) {
        self.pages.previous_page();
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pages.go_to_page(page);
    }

    pub fn snapshot(&self) -> PageView<T> {
        self.pages.snapshot()
    }

    fn recompute(&mut self) {
        let bookmarks = &self.bookmarks;
        let filtered = apply_filters(&self.raw, &self.filter, |id| bookmarks.contains(id));
        self.pages.set_items(filtered);
    }
}
