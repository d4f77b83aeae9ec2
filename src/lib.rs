// ============================================================================
// Learnify list engine
// ============================================================================
//
// Pagination, bookmark sets and search filtering shared by every list page
// (courses, resources, quiz history, communities).

pub mod bookmark;
pub mod catalog;
pub mod config;
pub mod core;
pub mod optimistic;
pub mod pagination;
pub mod store;

pub use bookmark::{BookmarkEngine, BookmarkScope, EngineState};
pub use catalog::{
    Bookmarkable, Community, Course, ListFilter, ListView, QuizHistory, Resource, Searchable,
    apply_filters, newest_first,
};
pub use config::AppConfig;
pub use crate::core::{BookmarkRecord, EntityKind, Error, MutationAction, Result, StoreError};
pub use pagination::{PageToken, PageView, Paginator, page_strip, render_strip};
pub use store::{BookmarkStore, InMemoryBookmarkStore, JsonFileBookmarkStore};
