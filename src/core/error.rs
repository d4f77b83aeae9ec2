use crate::core::types::{EntityKind, MutationAction};
use thiserror::Error;

/// Failures reported by a [`BookmarkStore`](crate::store::BookmarkStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("persistence service unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt store data: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to load {kind} bookmarks for user '{user_id}': {source}")]
    Load {
        user_id: String,
        kind: EntityKind,
        #[source]
        source: StoreError,
    },

    #[error("Failed to {action} bookmark '{entity_id}': {source}")]
    Mutation {
        entity_id: String,
        action: MutationAction,
        #[source]
        source: StoreError,
    },

    #[error("Bookmarks are not loaded; call load() with a user and entity kind first")]
    NotLoaded,
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// The underlying store failure, if this error came from the persistence service.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Load { source, .. } | Self::Mutation { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
