//! Store state
//!
//! Everything a transaction may read or write. Transactions operate on a
//! working copy, so a failed operation leaves no trace in any component.
//! Facts recorded during a transaction stay pending here until the store
//! commits them to its journal.

use crate::graph::BoostGraph;
use crate::grants::GrantStore;
use crate::hooks::HookRegistry;
use crate::issuance::IssuanceLog;
use crate::profiles::ProfileRegistry;
use boost_core::BoostFact;

/// Complete transactional state
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Resource graph
    pub graph: BoostGraph,
    /// Role edges
    pub grants: GrantStore,
    /// Claim hooks
    pub hooks: HookRegistry,
    /// Issuance log
    pub issuances: IssuanceLog,
    /// Profiles
    pub profiles: ProfileRegistry,
    pending: Vec<BoostFact>,
}

impl StoreState {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fact for the journal; appended when the transaction commits
    pub fn record(&mut self, fact: BoostFact) {
        tracing::trace!(fact_type = fact.fact_type(), boost = %fact.boost_uri(), "fact recorded");
        self.pending.push(fact);
    }

    /// Facts recorded and not yet committed, in recording order
    pub fn pending(&self) -> &[BoostFact] {
        &self.pending
    }

    /// Drain the pending facts
    pub fn take_pending(&mut self) -> Vec<BoostFact> {
        std::mem::take(&mut self.pending)
    }
}
