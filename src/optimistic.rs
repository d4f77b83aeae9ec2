//! Optimistic writes against a remote store.
//!
//! A [`Slot`] is one piece of local state that mirrors a remote value. The
//! local value is switched to the expected result before the remote write is
//! awaited, and put back if the remote write fails or is abandoned.

use std::future::Future;

pub trait Slot {
    type Value;

    fn read(&self) -> Self::Value;
    fn write(&self, value: Self::Value);

    /// Undo the optimistic write; `snapshot` is the value read before it.
    fn restore(&self, snapshot: Self::Value) {
        self.write(snapshot);
    }

    /// The remote write succeeded and the optimistic value stands.
    fn commit(&self) {}
}

/// Restores the snapshot on drop unless disarmed.
struct Rollback<'a, S: Slot + ?Sized> {
    slot: &'a S,
    snapshot: Option<S::Value>,
}

impl<S: Slot + ?Sized> Rollback<'_, S> {
    fn disarm(mut self) {
        self.snapshot = None;
    }
}

impl<S: Slot + ?Sized> Drop for Rollback<'_, S> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.slot.restore(snapshot);
        }
    }
}

/// Apply `next` to `slot`, then await `remote`.
///
/// On `Err` the slot is restored to the value it held before the call and the
/// error is returned unchanged. Dropping the returned future before `remote`
/// resolves restores the slot as well. `remote` is not polled before the
/// local write.
pub async fn write_optimistically<S, Fut, E>(slot: &S, next: S::Value, remote: Fut) -> Result<(), E>
where
    S: Slot + ?Sized,
    Fut: Future<Output = Result<(), E>>,
{
    let rollback = Rollback {
        slot,
        snapshot: Some(slot.read()),
    };
    slot.write(next);

    match remote.await {
        Ok(()) => {
            rollback.disarm();
            slot.commit();
            Ok(())
        }
        Err(err) => {
            drop(rollback);
            Err(err)
        }
    }
}
