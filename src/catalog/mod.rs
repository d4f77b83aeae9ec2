//! List-page composition: search and bookmark filters feeding a [`Paginator`](crate::Paginator).

pub mod entities;
pub mod filter;
pub mod view;

pub use entities::{Community, Course, QuizHistory, Resource};
pub use filter::{ListFilter, apply_filters, newest_first};
pub use view::ListView;

use crate::core::EntityKind;
use chrono::{DateTime, Utc};

/// An entity that can be listed, searched and ordered on a list page.
pub trait Searchable {
    fn entity_id(&self) -> &str;

    /// Text fields matched by the search box.
    fn search_fields(&self) -> Vec<&str>;

    fn created_at(&self) -> DateTime<Utc>;

    /// Creator of the entity, for "mine only" listings.
    fn owner_id(&self) -> Option<&str> {
        None
    }
}

/// An entity users can bookmark.
pub trait Bookmarkable: Searchable {
    const KIND: EntityKind;
}
