/// Bookmark engine tests
///
/// Covers load/failure handling, optimistic writes with rollback, and the
/// per-id ordering of writes. Remote calls are held open with a semaphore so
/// the in-flight state can be observed deterministically.
/// Run with: cargo test --test bookmark_tests

use async_trait::async_trait;
use learnify::store::StoreResult;
use learnify::{
    BookmarkEngine, BookmarkRecord, BookmarkStore, EngineState, EntityKind, Error,
    InMemoryBookmarkStore, StoreError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio_test::task::spawn;
use tokio_test::{assert_pending, assert_ready};

/// In-memory store whose calls can be held open and made to fail.
struct ScriptedStore {
    inner: InMemoryBookmarkStore,
    gated: AtomicBool,
    gate: Semaphore,
    fail_loads: AtomicBool,
    failing_writes: Mutex<HashSet<String>>,
    writes: AtomicUsize,
}

impl ScriptedStore {
    fn new() -> Self {
        Self {
            inner: InMemoryBookmarkStore::new(),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            fail_loads: AtomicBool::new(false),
            failing_writes: Mutex::new(HashSet::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Every call waits for a permit handed out by [`ScriptedStore::release`].
    fn gated() -> Self {
        let store = Self::new();
        store.gated.store(true, Ordering::SeqCst);
        store
    }

    fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    fn fail_next_write(&self, entity_id: &str) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(entity_id.to_string());
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        if self.gated.load(Ordering::SeqCst) {
            self.gate.acquire().await.unwrap().forget();
        }
    }

    fn take_failure(&self, entity_id: &str) -> StoreResult<()> {
        if self.failing_writes.lock().unwrap().remove(entity_id) {
            return Err(StoreError::unavailable("connection reset"));
        }
        Ok(())
    }
}

#[async_trait]
impl BookmarkStore for ScriptedStore {
    async fn list_bookmarks(
        &self,
        user_id: &str,
        kind: EntityKind,
    ) -> StoreResult<Vec<BookmarkRecord>> {
        self.pass_gate().await;
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("service offline"));
        }
        self.inner.list_bookmarks(user_id, kind).await
    }

    async fn create_bookmark(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.take_failure(entity_id)?;
        self.inner.create_bookmark(user_id, kind, entity_id).await
    }

    async fn delete_bookmark(
        &self,
        user_id: &str,
        kind: EntityKind,
        entity_id: &str,
    ) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.take_failure(entity_id)?;
        self.inner.delete_bookmark(user_id, kind, entity_id).await
    }
}

async fn loaded_engine(store: Arc<ScriptedStore>) -> BookmarkEngine {
    let engine = BookmarkEngine::new(store);
    engine.load("u1", EntityKind::Resource).await.unwrap();
    engine
}

async fn remote_ids(store: &ScriptedStore) -> Vec<String> {
    let mut ids: Vec<String> = store
        .inner
        .list_bookmarks("u1", EntityKind::Resource)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.entity_id)
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_load_replaces_local_set() {
    let store = Arc::new(ScriptedStore::new());
    store.inner.create_bookmark("u1", EntityKind::Resource, "r1").await.unwrap();
    store.inner.create_bookmark("u1", EntityKind::Resource, "r2").await.unwrap();
    store.inner.create_bookmark("u1", EntityKind::Course, "c1").await.unwrap();

    let engine = BookmarkEngine::new(store.clone());
    assert!(!engine.is_bookmarked("r1"));

    engine.load("u1", EntityKind::Resource).await.unwrap();
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(engine.bookmarks(), vec!["r1", "r2"]);
    assert!(!engine.is_bookmarked("c1"));

    // Repeated loads are harmless.
    engine.load("u1", EntityKind::Resource).await.unwrap();
    assert_eq!(engine.bookmarks(), vec!["r1", "r2"]);
}

#[tokio::test]
async fn test_failed_load_leaves_empty_set_and_can_retry() {
    let store = Arc::new(ScriptedStore::new());
    store.inner.create_bookmark("u1", EntityKind::Resource, "r1").await.unwrap();

    let engine = loaded_engine(store.clone()).await;
    assert!(engine.is_bookmarked("r1"));

    store.fail_loads.store(true, Ordering::SeqCst);
    let err = engine.load("u1", EntityKind::Resource).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Load { kind: EntityKind::Resource, source: StoreError::Unavailable(_), .. }
    ));
    assert_eq!(engine.state(), EngineState::Failed);
    assert!(engine.is_empty());
    assert!(!engine.is_bookmarked("r1"));

    store.fail_loads.store(false, Ordering::SeqCst);
    engine.load("u1", EntityKind::Resource).await.unwrap();
    assert_eq!(engine.state(), EngineState::Ready);
    assert!(engine.is_bookmarked("r1"));
}

#[tokio::test]
async fn test_switching_user_discards_previous_set() {
    let store = Arc::new(ScriptedStore::new());
    store.inner.create_bookmark("u1", EntityKind::Quiz, "q1").await.unwrap();
    store.inner.create_bookmark("u2", EntityKind::Quiz, "q2").await.unwrap();

    let engine = BookmarkEngine::new(store);
    engine.load("u1", EntityKind::Quiz).await.unwrap();
    assert!(engine.is_bookmarked("q1"));

    engine.load("u2", EntityKind::Quiz).await.unwrap();
    assert!(!engine.is_bookmarked("q1"));
    assert!(engine.is_bookmarked("q2"));
    assert_eq!(engine.scope().unwrap().user_id, "u2");
}

#[tokio::test]
async fn test_add_is_visible_before_remote_confirms() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;

    let mut add = spawn(engine.add_bookmark("r1"));
    assert_pending!(add.poll());
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(engine.state(), EngineState::Mutating);
    assert!(remote_ids(&store).await.is_empty());

    store.release(1);
    assert!(add.is_woken());
    assert_ready!(add.poll()).unwrap();
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(remote_ids(&store).await, vec!["r1"]);
}

#[tokio::test]
async fn test_failed_add_rolls_back() {
    let store = Arc::new(ScriptedStore::new());
    let engine = loaded_engine(store.clone()).await;

    store.fail_next_write("r1");
    let err = engine.add_bookmark("r1").await.unwrap_err();
    match err {
        Error::Mutation { entity_id, source, .. } => {
            assert_eq!(entity_id, "r1");
            assert!(matches!(source, StoreError::Unavailable(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!engine.is_bookmarked("r1"));
    assert_eq!(engine.state(), EngineState::Ready);
}

#[tokio::test]
async fn test_failed_remove_reinserts() {
    let store = Arc::new(ScriptedStore::new());
    store.inner.create_bookmark("u1", EntityKind::Resource, "r1").await.unwrap();
    let engine = loaded_engine(store.clone()).await;

    store.fail_next_write("r1");
    assert!(engine.remove_bookmark("r1").await.is_err());
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(remote_ids(&store).await, vec!["r1"]);
}

#[tokio::test]
async fn test_conflict_and_not_found_are_no_ops() {
    let store = Arc::new(ScriptedStore::new());
    let engine = loaded_engine(store.clone()).await;

    // Someone else created it after our load.
    store.inner.create_bookmark("u1", EntityKind::Resource, "r1").await.unwrap();
    engine.add_bookmark("r1").await.unwrap();
    assert!(engine.is_bookmarked("r1"));

    engine.remove_bookmark("r2").await.unwrap();
    assert!(!engine.is_bookmarked("r2"));
    assert_eq!(remote_ids(&store).await, vec!["r1"]);
}

#[tokio::test]
async fn test_distinct_ids_reach_net_effect() {
    let store = Arc::new(ScriptedStore::new());
    let engine = loaded_engine(store.clone()).await;

    for id in ["a", "b", "c", "d"] {
        engine.add_bookmark(id).await.unwrap();
    }
    engine.remove_bookmark("b").await.unwrap();
    engine.add_bookmark("e").await.unwrap();
    engine.remove_bookmark("d").await.unwrap();

    assert_eq!(engine.bookmarks(), vec!["a", "c", "e"]);
    assert_eq!(remote_ids(&store).await, vec!["a", "c", "e"]);
}

#[tokio::test]
async fn test_concurrent_writes_on_distinct_ids() {
    let store = Arc::new(ScriptedStore::new());
    let engine = loaded_engine(store.clone()).await;

    let ids: Vec<String> = (0..20).map(|i| format!("r{i}")).collect();
    let results = futures::future::join_all(ids.iter().map(|id| engine.add_bookmark(id))).await;
    assert!(results.iter().all(Result::is_ok));

    assert_eq!(engine.len(), 20);
    assert_eq!(remote_ids(&store).await.len(), 20);
}

#[tokio::test]
async fn test_write_on_same_id_waits_for_previous() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;

    let mut add = spawn(engine.add_bookmark("r1"));
    assert_pending!(add.poll());

    let mut remove = spawn(engine.remove_bookmark("r1"));
    assert_pending!(remove.poll());
    // The queued remove has neither touched local state nor the store.
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(store.writes(), 1);

    store.release(1);
    assert_ready!(add.poll()).unwrap();

    assert_pending!(remove.poll());
    assert!(!engine.is_bookmarked("r1"));
    assert_eq!(store.writes(), 2);

    store.release(1);
    assert_ready!(remove.poll()).unwrap();
    assert!(!engine.is_bookmarked("r1"));
    assert!(remote_ids(&store).await.is_empty());
}

#[tokio::test]
async fn test_rollback_never_overwrites_later_toggle() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;

    store.fail_next_write("r1");
    let mut first = spawn(engine.toggle_bookmark("r1"));
    assert_pending!(first.poll());
    assert!(engine.is_bookmarked("r1"));

    let mut second = spawn(engine.toggle_bookmark("r1"));
    assert_pending!(second.poll());

    store.release(1);
    assert!(assert_ready!(first.poll()).is_err());
    assert!(!engine.is_bookmarked("r1"));

    // The second toggle sees the rolled-back state, so it adds again.
    assert_pending!(second.poll());
    assert!(engine.is_bookmarked("r1"));
    store.release(1);
    assert!(assert_ready!(second.poll()).unwrap());
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(remote_ids(&store).await, vec!["r1"]);
}

#[tokio::test]
async fn test_other_ids_proceed_while_one_is_in_flight() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;

    let mut slow = spawn(engine.add_bookmark("r1"));
    assert_pending!(slow.poll());

    let mut other = spawn(engine.add_bookmark("r2"));
    assert_pending!(other.poll());
    assert_eq!(store.writes(), 2);
    assert!(engine.is_bookmarked("r2"));

    store.release(2);
    assert_ready!(other.poll()).unwrap();
    assert_ready!(slow.poll()).unwrap();
    assert_eq!(engine.bookmarks(), vec!["r1", "r2"]);
}

#[tokio::test]
async fn test_close_suppresses_late_results() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;

    store.fail_next_write("r1");
    let mut add = spawn(engine.add_bookmark("r1"));
    assert_pending!(add.poll());

    engine.close();
    assert!(engine.is_empty());

    store.release(1);
    assert!(assert_ready!(add.poll()).is_err());
    assert!(engine.is_empty());
    assert_eq!(engine.state(), EngineState::Uninitialized);
}

#[tokio::test]
async fn test_superseded_load_is_discarded() {
    let store = Arc::new(ScriptedStore::gated());
    store.inner.create_bookmark("u1", EntityKind::Resource, "r1").await.unwrap();
    let engine = BookmarkEngine::new(store.clone());

    let mut load = spawn(engine.load("u1", EntityKind::Resource));
    assert_pending!(load.poll());
    assert_eq!(engine.state(), EngineState::Loading);

    engine.close();
    store.release(1);
    assert_ready!(load.poll()).unwrap();
    assert!(!engine.is_bookmarked("r1"));
    assert_eq!(engine.state(), EngineState::Uninitialized);
}

#[tokio::test]
async fn test_reload_keeps_write_in_flight() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;

    let mut reload = spawn(engine.load("u1", EntityKind::Resource));
    assert_pending!(reload.poll());
    let mut add = spawn(engine.add_bookmark("r1"));
    assert_pending!(add.poll());

    // The reload reads the store before the add reaches it.
    store.release(1);
    assert_ready!(reload.poll()).unwrap();
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(engine.state(), EngineState::Mutating);

    store.release(1);
    assert_ready!(add.poll()).unwrap();
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(remote_ids(&store).await, vec!["r1"]);
}

#[tokio::test]
async fn test_rollback_after_reload_restores_reloaded_membership() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;
    // Bookmarked elsewhere after the first load.
    store.inner.create_bookmark("u1", EntityKind::Resource, "r1").await.unwrap();

    store.fail_next_write("r1");
    let mut add = spawn(engine.add_bookmark("r1"));
    assert_pending!(add.poll());
    let mut reload = spawn(engine.load("u1", EntityKind::Resource));
    assert_pending!(reload.poll());

    store.release(2);
    assert_ready!(reload.poll()).unwrap();
    assert!(engine.is_bookmarked("r1"));
    assert!(assert_ready!(add.poll()).is_err());
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(engine.state(), EngineState::Ready);
}

#[tokio::test]
async fn test_failed_reload_keeps_write_in_flight() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;

    store.fail_loads.store(true, Ordering::SeqCst);
    let mut reload = spawn(engine.load("u1", EntityKind::Resource));
    assert_pending!(reload.poll());
    let mut add = spawn(engine.add_bookmark("r1"));
    assert_pending!(add.poll());

    store.release(1);
    let err = assert_ready!(reload.poll()).unwrap_err();
    assert!(matches!(err, Error::Load { .. }));
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(engine.state(), EngineState::Failed);

    store.release(1);
    assert_ready!(add.poll()).unwrap();
    assert!(engine.is_bookmarked("r1"));
}

#[tokio::test]
async fn test_dropped_write_is_rolled_back() {
    let store = Arc::new(ScriptedStore::gated());
    store.release(1);
    let engine = loaded_engine(store.clone()).await;

    {
        let mut add = spawn(engine.add_bookmark("r1"));
        assert_pending!(add.poll());
        assert!(engine.is_bookmarked("r1"));
        assert_eq!(engine.state(), EngineState::Mutating);
    }
    assert!(!engine.is_bookmarked("r1"));
    assert_eq!(engine.state(), EngineState::Ready);

    // The id's turn was released with the dropped write.
    store.gated.store(false, Ordering::SeqCst);
    engine.add_bookmark("r1").await.unwrap();
    assert!(engine.is_bookmarked("r1"));
    assert_eq!(remote_ids(&store).await, vec!["r1"]);
}

#[tokio::test]
async fn test_engine_handles_share_state_across_tasks() {
    let store = Arc::new(InMemoryBookmarkStore::new());
    let engine = BookmarkEngine::new(store);
    engine.load("u1", EntityKind::Course).await.unwrap();

    let mut handles = vec![];
    for task_id in 0..5 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.add_bookmark(&format!("c{task_id}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(engine.len(), 5);
}
