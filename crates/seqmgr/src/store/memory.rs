use alloc::sync::Arc;
use crate::mutex::{Mutex, lock_unpoisoned};
use crate::store::{SeqState, SeqStore, StoreError};

/// A [`SeqStore`] kept in memory.
///
/// Clones share the same slot, so a test can hand one clone to a server,
/// drop the server, and start a new one from another clone to simulate a
/// restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<SeqState>>>,
}

impl MemoryStore {
    /// An empty store. The first `load` returns [`StoreError::NoData`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `state`.
    pub fn with_state(state: SeqState) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(state))),
        }
    }

    /// The last saved state, if any.
    pub fn snapshot(&self) -> Option<SeqState> {
        *lock_unpoisoned(&self.slot)
    }
}

impl SeqStore for MemoryStore {
    fn load(&self) -> Result<SeqState, StoreError> {
        self.snapshot().ok_or(StoreError::NoData)
    }

    fn save(&self, state: &SeqState) -> Result<(), StoreError> {
        *lock_unpoisoned(&self.slot) = Some(*state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Range;

    #[test]
    fn empty_store_reports_no_data() {
        assert_eq!(MemoryStore::new().load(), Err(StoreError::NoData));
    }

    #[test]
    fn clones_share_the_slot() {
        let store = MemoryStore::new();
        let other = store.clone();
        let state = SeqState {
            meta: Range::new(1, 2),
            super_range: Range::new(3, 4),
        };
        store.save(&state).unwrap();
        assert_eq!(other.load(), Ok(state));
    }

    #[test]
    fn store_survives_a_panicking_holder() {
        let store = MemoryStore::with_state(SeqState {
            meta: Range::new(1, 2),
            super_range: Range::EMPTY,
        });
        let shared = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = lock_unpoisoned(&shared.slot);
            panic!("holder panicked");
        })
        .join();

        assert_eq!(store.load().unwrap().meta, Range::new(1, 2));
        let next = SeqState {
            meta: Range::new(5, 9),
            super_range: Range::EMPTY,
        };
        store.save(&next).unwrap();
        assert_eq!(store.snapshot(), Some(next));
    }
}
