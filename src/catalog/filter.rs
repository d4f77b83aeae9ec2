use super::Searchable;

/// What a list page narrows its collection down to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-insensitive substring; blank matches everything.
    pub search: String,
    pub bookmarked_only: bool,
    /// Keep only entities created by this user.
    pub owner: Option<String>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn bookmarked_only(mut self, enabled: bool) -> Self {
        self.bookmarked_only = enabled;
        self
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// True when the filter lets every item through.
    pub fn is_passthrough(&self) -> bool {
        self.search.trim().is_empty() && !self.bookmarked_only && self.owner.is_none()
    }
}

fn matches_search<T: Searchable>(item: &T, needle: &str) -> bool {
    needle.is_empty()
        || item
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Narrow `items` by `filter`, keeping their order.
///
/// `is_bookmarked` is only consulted when `filter.bookmarked_only` is set.
pub fn apply_filters<T, F>(items: &[T], filter: &ListFilter, is_bookmarked: F) -> Vec<T>
where
    T: Searchable + Clone,
    F: Fn(&str) -> bool,
{
    let needle = filter.search.trim().to_lowercase();

    items
        .iter()
        .filter(|item| matches_search(*item, &needle))
        .filter(|item| !filter.bookmarked_only || is_bookmarked(item.entity_id()))
        .filter(|item| match &filter.owner {
            Some(owner) => item.owner_id() == Some(owner.as_str()),
            None => true,
        })
        .cloned()
        .collect()
}

/// Sort newest first, the order list pages display. Ties keep their order.
pub fn newest_first<T: Searchable>(items: &mut [T]) {
    items.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
}
