//! Persistence contract for bookmark records.
//!
//! The engines never talk to a backend directly; they go through
//! [`BookmarkStore`], so the hosted service, a local file, or a test double
//! can sit behind the same calls.

mod json_file;
mod memory;

pub use json_file::JsonFileBookmarkStore;
pub use memory::InMemoryBookmarkStore;

use crate::core::{BookmarkRecord, EntityKind, StoreError};
use async_trait::async_trait;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// All bookmark records of `user_id` for `kind`, oldest first.
    async fn list_bookmarks(&self, user_id: &str, kind: EntityKind)
    -> StoreResult<Vec<BookmarkRecord>>;

    /// Fails with [`StoreError::Conflict`] when the bookmark already exists.
    async fn create_bookmark(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> StoreResult<()>;

    /// Fails with [`StoreError::NotFound`] when there is nothing to delete.
    async fn delete_bookmark(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> StoreResult<()>;
}

fn describe(user_id: &str, kind: EntityKind, entity_id: &str) -> String {
    format!("{kind} '{entity_id}' for user '{user_id}'")
}

/// Shared record bookkeeping for stores that keep the whole table in a `Vec`.
pub(crate) fn insert_record(
    records: &mut Vec<BookmarkRecord>,
    user_id: &str,
    kind: EntityKind,
    entity_id: &str,
) -> StoreResult<()> {
    let exists = records
        .iter()
        .any(|record| record.matches(user_id, kind) && record.entity_id == entity_id);
    if exists {
        return Err(StoreError::conflict(describe(user_id, kind, entity_id)));
    }

    records.push(BookmarkRecord::new(user_id, kind, entity_id));
    Ok(())
}

pub(crate) fn remove_record(
    records: &mut Vec<BookmarkRecord>,
    user_id: &str,
    kind: EntityKind,
    entity_id: &str,
) -> StoreResult<()> {
    let position = records
        .iter()
        .position(|record| record.matches(user_id, kind) && record.entity_id == entity_id)
        .ok_or_else(|| StoreError::not_found(describe(user_id, kind, entity_id)))?;
    records.remove(position);
    Ok(())
}

pub(crate) fn select_records(
    records: &[BookmarkRecord],
    user_id: &str,
    kind: EntityKind,
) -> Vec<BookmarkRecord> {
    records
        .iter()
        .filter(|record| record.matches(user_id, kind))
        .cloned()
        .collect()
}
