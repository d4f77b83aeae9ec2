//! Per-user bookmark sets backed by a [`BookmarkStore`].
//!
//! Reads are local and synchronous. Writes are applied to the local set
//! first and then persisted; a failed write is rolled back locally and
//! reported as [`Error::Mutation`]. Writes to the same entity id run one
//! after another, in call order, so a rollback can never clobber the state
//! of a later write. A reload that lands while writes are in flight keeps
//! their optimistic membership, and a write whose future is dropped is rolled
//! back like a failed one.
//!
//! One engine owns the bookmarks of one `(user, kind)` scope at a time. Two
//! engines writing the same scope concurrently are not coordinated.

mod keyed;

use crate::core::{EntityKind, Error, MutationAction, Result, StoreError};
use crate::optimistic::{Slot, write_optimistically};
use crate::store::BookmarkStore;
use keyed::KeyedLocks;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Lifecycle of a [`BookmarkEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No scope loaded yet, or the engine was closed.
    Uninitialized,
    Loading,
    Ready,
    /// The last load failed; only ids with a write in flight are set until a
    /// retry succeeds.
    Failed,
    /// Ready, with at least one remote write in flight.
    Mutating,
}

/// The `(user, kind)` pair a bookmark set belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookmarkScope {
    pub user_id: String,
    pub kind: EntityKind,
}

impl BookmarkScope {
    pub fn new(user_id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

/// A write that has been applied locally but not yet confirmed.
struct PendingWrite {
    /// Membership once the write is persisted.
    target: bool,
    /// Last known persisted membership, restored on rollback.
    base: bool,
}

struct LocalState {
    scope: Option<BookmarkScope>,
    ids: HashSet<String>,
    phase: Phase,
    // Bumped by every load and close; a load result tagged with an older value is dropped.
    load_generation: u64,
    // Bumped on scope change and close; writes from an older epoch leave local state alone.
    epoch: u64,
    pending: HashMap<String, PendingWrite>,
}

impl LocalState {
    fn set_member(&mut self, entity_id: &str, present: bool) {
        if present {
            self.ids.insert(entity_id.to_string());
        } else {
            self.ids.remove(entity_id);
        }
    }

    /// Replace the set with freshly fetched ids, keeping in-flight writes on top.
    fn replace_ids(&mut self, fetched: HashSet<String>) {
        for (entity_id, write) in self.pending.iter_mut() {
            write.base = fetched.contains(entity_id);
        }
        self.ids = fetched;
        self.reapply_pending();
    }

    fn reapply_pending(&mut self) {
        let LocalState { ids, pending, .. } = self;
        for (entity_id, write) in pending.iter() {
            if write.target {
                ids.insert(entity_id.clone());
            } else {
                ids.remove(entity_id);
            }
        }
    }
}

struct Inner {
    store: Arc<dyn BookmarkStore>,
    local: RwLock<LocalState>,
    locks: KeyedLocks,
}

impl Inner {
    fn read_local(&self) -> RwLockReadGuard<'_, LocalState> {
        self.local.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_local(&self) -> RwLockWriteGuard<'_, LocalState> {
        self.local.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Membership of one entity id, pinned to the epoch the write started in.
///
/// The optimistic write registers a [`PendingWrite`]; commit and rollback
/// clear it. Rollback restores the pending write's base, which a reload may
/// have refreshed since the write started.
struct MembershipSlot<'a> {
    inner: &'a Inner,
    entity_id: &'a str,
    epoch: u64,
}

impl MembershipSlot<'_> {
    fn current(&self) -> Option<RwLockWriteGuard<'_, LocalState>> {
        let local = self.inner.write_local();
        (local.epoch == self.epoch).then_some(local)
    }
}

impl Slot for MembershipSlot<'_> {
    type Value = bool;

    fn read(&self) -> bool {
        self.inner.read_local().ids.contains(self.entity_id)
    }

    fn write(&self, present: bool) {
        let Some(mut local) = self.current() else {
            return;
        };
        let base = local.ids.contains(self.entity_id);
        local.pending.insert(
            self.entity_id.to_string(),
            PendingWrite {
                target: present,
                base,
            },
        );
        local.set_member(self.entity_id, present);
    }

    fn restore(&self, snapshot: bool) {
        let Some(mut local) = self.current() else {
            return;
        };
        let base = local
            .pending
            .remove(self.entity_id)
            .map_or(snapshot, |write| write.base);
        local.set_member(self.entity_id, base);
    }

    fn commit(&self) {
        if let Some(mut local) = self.current() {
            local.pending.remove(self.entity_id);
        }
    }
}

/// Bookmark set of the current user for one entity kind.
///
/// Cloning yields another handle to the same set.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use learnify::{BookmarkEngine, EntityKind, InMemoryBookmarkStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = BookmarkEngine::new(Arc::new(InMemoryBookmarkStore::new()));
/// engine.load("user-1", EntityKind::Resource).await?;
///
/// engine.add_bookmark("r1").await?;
/// assert!(engine.is_bookmarked("r1"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BookmarkEngine {
    inner: Arc<Inner>,
}

impl BookmarkEngine {
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                local: RwLock::new(LocalState {
                    scope: None,
                    ids: HashSet::new(),
                    phase: Phase::Uninitialized,
                    load_generation: 0,
                    epoch: 0,
                    pending: HashMap::new(),
                }),
                locks: KeyedLocks::default(),
            }),
        }
    }

    /// Fetch the bookmarks of `user_id` for `kind` and replace the local set.
    ///
    /// Safe to call repeatedly. Switching to another scope discards the old
    /// set right away. Ids with a write still in flight keep their optimistic
    /// membership on top of the fetched records. On failure the set is left
    /// empty apart from those ids and the engine is [`EngineState::Failed`];
    /// calling `load` again retries. A load that was overtaken by a newer
    /// `load` or by [`close`](Self::close) returns `Ok(())` without touching
    /// the set.
    pub async fn load(&self, user_id: &str, kind: EntityKind) -> Result<()> {
        let scope = BookmarkScope::new(user_id, kind);
        let generation = {
            let mut local = self.inner.write_local();
            if local.scope.as_ref() != Some(&scope) {
                local.ids.clear();
                local.pending.clear();
                local.epoch += 1;
            }
            local.scope = Some(scope);
            local.phase = Phase::Loading;
            local.load_generation += 1;
            local.load_generation
        };

        debug!(user_id, %kind, "loading bookmarks");
        let fetched = self.inner.store.list_bookmarks(user_id, kind).await;

        let mut local = self.inner.write_local();
        if local.load_generation != generation {
            debug!(user_id, %kind, "discarding superseded bookmark load");
            return Ok(());
        }

        match fetched {
            Ok(records) => {
                local.replace_ids(records.into_iter().map(|record| record.entity_id).collect());
                local.phase = Phase::Ready;
                debug!(user_id, %kind, count = local.ids.len(), "bookmarks loaded");
                Ok(())
            }
            Err(source) => {
                local.ids.clear();
                local.reapply_pending();
                local.phase = Phase::Failed;
                warn!(user_id, %kind, error = %source, "failed to load bookmarks");
                Err(Error::Load {
                    user_id: user_id.to_string(),
                    kind,
                    source,
                })
            }
        }
    }

    /// Local membership test. Always `false` until a load has completed.
    pub fn is_bookmarked(&self, entity_id: &str) -> bool {
        self.inner.read_local().ids.contains(entity_id)
    }

    pub async fn add_bookmark(&self, entity_id: &str) -> Result<()> {
        let _turn = self.inner.locks.lock(entity_id).await;
        self.apply(entity_id, MutationAction::Add).await
    }

    pub async fn remove_bookmark(&self, entity_id: &str) -> Result<()> {
        let _turn = self.inner.locks.lock(entity_id).await;
        self.apply(entity_id, MutationAction::Remove).await
    }

    /// Flip the membership of `entity_id` and return the new membership.
    ///
    /// The direction is decided once earlier writes to the same id have
    /// settled, so back-to-back toggles alternate as the user intended.
    pub async fn toggle_bookmark(&self, entity_id: &str) -> Result<bool> {
        let _turn = self.inner.locks.lock(entity_id).await;
        let action = if self.is_bookmarked(entity_id) {
            MutationAction::Remove
        } else {
            MutationAction::Add
        };
        self.apply(entity_id, action).await?;
        Ok(action.target_membership())
    }

    /// Forget the set and scope, as on unmount or logout.
    ///
    /// Writes still in flight complete remotely but no longer touch local state.
    pub fn close(&self) {
        let mut local = self.inner.write_local();
        local.load_generation += 1;
        local.epoch += 1;
        local.scope = None;
        local.ids.clear();
        local.pending.clear();
        local.phase = Phase::Uninitialized;
    }

    pub fn state(&self) -> EngineState {
        let local = self.inner.read_local();
        match local.phase {
            Phase::Uninitialized => EngineState::Uninitialized,
            Phase::Loading => EngineState::Loading,
            Phase::Failed => EngineState::Failed,
            Phase::Ready if !local.pending.is_empty() => EngineState::Mutating,
            Phase::Ready => EngineState::Ready,
        }
    }

    pub fn scope(&self) -> Option<BookmarkScope> {
        self.inner.read_local().scope.clone()
    }

    /// Bookmarked ids, sorted.
    pub fn bookmarks(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.read_local().ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.inner.read_local().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Callers must hold the per-id turn for `entity_id`.
    async fn apply(&self, entity_id: &str, action: MutationAction) -> Result<()> {
        let (scope, epoch) = {
            let local = self.inner.read_local();
            let scope = local.scope.clone().ok_or(Error::NotLoaded)?;
            (scope, local.epoch)
        };

        let slot = MembershipSlot {
            inner: &self.inner,
            entity_id,
            epoch,
        };
        let remote = persist(&*self.inner.store, &scope, entity_id, action);
        let outcome = write_optimistically(&slot, action.target_membership(), remote).await;

        match outcome {
            Ok(()) => {
                debug!(user_id = %scope.user_id, kind = %scope.kind, entity_id, %action, "bookmark persisted");
                Ok(())
            }
            Err(source) => {
                warn!(
                    user_id = %scope.user_id,
                    kind = %scope.kind,
                    entity_id,
                    %action,
                    error = %source,
                    "bookmark write failed, local state rolled back"
                );
                Err(Error::Mutation {
                    entity_id: entity_id.to_string(),
                    action,
                    source,
                })
            }
        }
    }
}

/// Remote half of a bookmark write. Creating an existing bookmark or deleting
/// a missing one already leaves the store in the requested state.
async fn persist(
    store: &dyn BookmarkStore,
    scope: &BookmarkScope,
    entity_id: &str,
    action: MutationAction,
) -> std::result::Result<(), StoreError> {
    let result = match action {
        MutationAction::Add => {
            store
                .create_bookmark(&scope.user_id, scope.kind, entity_id)
                .await
        }
        MutationAction::Remove => {
            store
                .delete_bookmark(&scope.user_id, scope.kind, entity_id)
                .await
        }
    };

    match (action, result) {
        (MutationAction::Add, Err(StoreError::Conflict(_)))
        | (MutationAction::Remove, Err(StoreError::NotFound(_))) => Ok(()),
        (_, other) => other,
    }
}
