use super::{BookmarkStore, StoreResult, insert_record, remove_record, select_records};
use crate::core::{BookmarkRecord, EntityKind};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local bookmark table.
#[derive(Default)]
pub struct InMemoryBookmarkStore {
    records: RwLock<Vec<BookmarkRecord>>,
}

impl InMemoryBookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<BookmarkRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl BookmarkStore for InMemoryBookmarkStore {
    async fn list_bookmarks(
        &self,
        user_id: &str,
        kind: EntityKind,
    ) -> StoreResult<Vec<BookmarkRecord>> {
        Ok(select_records(&self.records.read().await, user_id, kind))
    }

    async fn create_bookmark(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> StoreResult<()> {
        insert_record(&mut *self.records.write().await, user_id, kind, entity_id)
    }

    async fn delete_bookmark(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> StoreResult<()> {
        remove_record(&mut *self.records.write().await, user_id, kind, entity_id)
    }
}
