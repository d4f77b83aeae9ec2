use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

type KeyLock = Arc<tokio::sync::Mutex<()>>;

struct Entry {
    lock: KeyLock,
    // Holders plus waiters, counted under the map lock.
    users: usize,
}

/// One async mutex per key, created on demand and dropped once idle.
///
/// Waiters on the same key are served in the order they asked (tokio's mutex
/// is fair); different keys never contend.
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<String, Entry>>,
}

impl KeyedLocks {
    pub(crate) async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let (claim, lock) = self.claim(key);
        let guard = lock.lock_owned().await;
        KeyedGuard {
            _guard: guard,
            _claim: claim,
        }
    }

    fn claim(&self, key: &str) -> (Claim<'_>, KeyLock) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = locks.entry(key.to_string()).or_insert_with(|| Entry {
            lock: KeyLock::default(),
            users: 0,
        });
        entry.users += 1;

        let claim = Claim {
            owner: self,
            key: key.to_string(),
        };
        (claim, Arc::clone(&entry.lock))
    }

    /// Keys that currently have a holder or a waiter.
    #[cfg(test)]
    pub(crate) fn active_keys(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Registration of one holder or waiter; the key is dropped with its last claim.
struct Claim<'a> {
    owner: &'a KeyedLocks,
    key: String,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut locks = self
            .owner
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let idle = match locks.get_mut(&self.key) {
            Some(entry) => {
                entry.users = entry.users.saturating_sub(1);
                entry.users == 0
            }
            None => false,
        };
        if idle {
            locks.remove(&self.key);
        }
    }
}

pub(crate) struct KeyedGuard<'a> {
    // Field order matters: the mutex is released before the claim goes.
    _guard: OwnedMutexGuard<()>,
    _claim: Claim<'a>,
}

impl std::fmt::Debug for KeyedGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedGuard")
            .field("key", &self._claim.key)
            .finish_non_exhaustive()
    }
}
