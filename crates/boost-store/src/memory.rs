//! Transactional store
//!
//! [`BoostStore`] is the storage collaborator: a snapshot read and an atomic
//! read-modify-write. [`MemoryStore`] implements it over a
//! `parking_lot::RwLock`; a write transaction mutates a working copy and
//! swaps it in only when the closure returns `Ok`. The fact journal lives
//! beside the state, so working copies never carry history.

use crate::state::StoreState;
use boost_core::{BoostFact, BoostResult};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

/// Transactional access to boost state
pub trait BoostStore: Send + Sync {
    /// Run `f` against a consistent snapshot
    fn snapshot<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R;

    /// Run `f` atomically. Changes are committed only if `f` returns `Ok`;
    /// on `Err` the state is left exactly as it was.
    fn with_transaction<R>(
        &self,
        f: impl FnOnce(&mut StoreState) -> BoostResult<R>,
    ) -> BoostResult<R>;

    /// Committed facts in commit order
    fn journal(&self) -> Vec<BoostFact>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    journal: RwLock<Vec<BoostFact>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `state`
    pub fn with_state(mut state: StoreState) -> Self {
        let journal = state.take_pending();
        Self {
            state: RwLock::new(state),
            journal: RwLock::new(journal),
        }
    }
}

impl BoostStore for MemoryStore {
    fn snapshot<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        let state = self.state.read();
        f(&state)
    }

    fn with_transaction<R>(
        &self,
        f: impl FnOnce(&mut StoreState) -> BoostResult<R>,
    ) -> BoostResult<R> {
        // Writers are serialized for the whole closure; readers keep seeing
        // the last committed state until the swap.
        let guard = self.state.upgradable_read();
        let mut working = StoreState::clone(&guard);
        let result = f(&mut working);
        if result.is_ok() {
            let facts = working.take_pending();
            let mut state = RwLockUpgradableReadGuard::upgrade(guard);
            self.journal.write().extend(facts);
            *state = working;
        } else {
            tracing::debug!("transaction aborted; working copy discarded");
        }
        result
    }

    fn journal(&self) -> Vec<BoostFact> {
        self.journal.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Boost, BoostPayload};
    use boost_core::{BoostError, BoostUri, ProfileId};
    use std::sync::Arc;

    fn boost(id: &str) -> Boost {
        Boost::new(
            BoostUri::new("example.org", id),
            ProfileId::new("admin"),
            BoostPayload::default(),
            0,
        )
    }

    #[test]
    fn failed_transaction_leaves_no_trace() {
        let store = MemoryStore::new();
        let result: BoostResult<()> = store.with_transaction(|state| {
            state.graph.insert(boost("a"))?;
            Err(BoostError::internal("abort"))
        });
        assert!(result.is_err());
        assert!(store.snapshot(|state| state.graph.is_empty()));
    }

    #[test]
    fn committed_transaction_is_visible() {
        let store = MemoryStore::new();
        store
            .with_transaction(|state| state.graph.insert(boost("a")))
            .unwrap();
        assert_eq!(store.snapshot(|state| state.graph.len()), 1);
    }

    fn created(id: &str) -> BoostFact {
        BoostFact::BoostCreated {
            boost: BoostUri::new("example.org", id),
            parent: None,
            creator: ProfileId::new("admin"),
            created_at_ms: 0,
        }
    }

    #[test]
    fn facts_reach_the_journal_only_on_commit() {
        let store = MemoryStore::new();
        let aborted: BoostResult<()> = store.with_transaction(|state| {
            state.record(created("a"));
            Err(BoostError::internal("abort"))
        });
        assert!(aborted.is_err());
        assert!(store.journal().is_empty());

        store
            .with_transaction(|state| {
                assert!(state.pending().is_empty());
                state.record(created("b"));
                Ok(())
            })
            .unwrap();
        store
            .with_transaction(|state| {
                assert!(state.pending().is_empty());
                state.record(created("c"));
                Ok(())
            })
            .unwrap();
        assert_eq!(store.journal(), vec![created("b"), created("c")]);
        assert!(store.snapshot(|state| state.pending().is_empty()));
    }

    #[test]
    fn concurrent_writers_serialize() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .with_transaction(|state| state.graph.insert(boost(&format!("b{i}"))))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.snapshot(|state| state.graph.len()), 8);
    }
}
