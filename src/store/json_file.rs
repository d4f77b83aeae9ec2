use super::{BookmarkStore, StoreResult, insert_record, remove_record, select_records};
use crate::core::{BookmarkRecord, EntityKind, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct BookmarkDocument {
    version: u32,
    records: Vec<BookmarkRecord>,
}

/// Bookmark table kept as one JSON document on disk.
///
/// Every write rewrites the document through a temporary file in the same
/// directory that is then renamed over the original, so readers never see a
/// half-written file. A missing file reads as an empty table.
pub struct JsonFileBookmarkStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileBookmarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> StoreResult<BookmarkDocument> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BookmarkDocument::default()),
            Err(err) => return Err(err.into()),
        };

        let document: BookmarkDocument = serde_json::from_slice(&bytes)?;
        if document.version > DOCUMENT_VERSION {
            return Err(StoreError::corrupt(format!(
                "unsupported bookmark document version {} in {}",
                document.version,
                self.path.display()
            )));
        }
        Ok(document)
    }

    async fn write_document(&self, document: BookmarkDocument) -> StoreResult<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &document))
            .await
            .map_err(|err| StoreError::unavailable(format!("bookmark writer task failed: {err}")))??;
        debug!(path = %self.path.display(), "bookmark document written");
        Ok(())
    }

    async fn modify<F>(&self, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Vec<BookmarkRecord>) -> StoreResult<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        apply(&mut document.records)?;
        document.version = DOCUMENT_VERSION;
        self.write_document(document).await
    }
}

fn write_atomically(path: &Path, document: &BookmarkDocument) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let serialized = serde_json::to_vec_pretty(document)?;
    let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
    temp.write_all(&serialized)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| StoreError::from(err.error))?;
    Ok(())
}

#[async_trait]
impl BookmarkStore for JsonFileBookmarkStore {
    async fn list_bookmarks(
        &self,
        user_id: &str,
        kind: EntityKind,
    ) -> StoreResult<Vec<BookmarkRecord>> {
        let document = self.read_document().await?;
        Ok(select_records(&document.records, user_id, kind))
    }

    async fn create_bookmark(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> StoreResult<()> {
        self.modify(|records| insert_record(records, user_id, kind, entity_id))
            .await
    }

    async fn delete_bookmark(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> StoreResult<()> {
        self.modify(|records| remove_record(records, user_id, kind, entity_id))
            .await
    }
}
