//! Grant store
//!
//! One role edge per (actor, boost). An edge has two layers:
//!
//! - the **explicit** layer, written by permission-management calls;
//! - the **contributed** layer, written by claim hooks and claim roles, with
//!   a reference count per granted flag and a record of which source
//!   contributed which flags.
//!
//! The effective role is the join of both layers. Retracting a source
//! decrements exactly the counts it added, so a flag survives as long as any
//! other source or the explicit layer still grants it.

use boost_core::{
    BoostFact, BoostUri, CredentialRef, GrantedFlag, HookId, JoinSemilattice, PermissionSet,
    ProfileId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// What contributed a grant to a role
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantSource {
    /// A claim hook fired for a credential
    Hook {
        /// Hook that fired
        hook_id: HookId,
        /// Credential whose claim fired it
        credential: CredentialRef,
    },
    /// The claimed boost's own claim role
    ClaimRole {
        /// Claimed credential
        credential: CredentialRef,
    },
}

impl GrantSource {
    /// Credential whose lifecycle governs this grant
    pub fn credential(&self) -> &CredentialRef {
        match self {
            GrantSource::Hook { credential, .. } | GrantSource::ClaimRole { credential } => {
                credential
            }
        }
    }
}

/// Role edge with provenance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleEdge {
    explicit: PermissionSet,
    sources: BTreeMap<GrantSource, PermissionSet>,
    tally: BTreeMap<GrantedFlag, u32>,
}

impl RoleEdge {
    /// Explicitly managed layer
    pub fn explicit(&self) -> &PermissionSet {
        &self.explicit
    }

    /// Layer contributed by claim hooks and claim roles
    pub fn contributed(&self) -> PermissionSet {
        PermissionSet::from_flags(self.tally.keys())
    }

    /// Join of both layers
    pub fn effective(&self) -> PermissionSet {
        self.explicit.join(&self.contributed())
    }

    /// Sources currently contributing to this edge
    pub fn sources(&self) -> impl Iterator<Item = (&GrantSource, &PermissionSet)> {
        self.sources.iter()
    }

    /// Whether the edge grants nothing
    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty() && self.tally.is_empty()
    }

    fn contribute(&mut self, source: GrantSource, permissions: PermissionSet) -> bool {
        if self.sources.contains_key(&source) {
            return false;
        }
        for flag in permissions.granted_flags() {
            *self.tally.entry(flag).or_insert(0) += 1;
        }
        self.sources.insert(source, permissions);
        true
    }

    fn retract(&mut self, source: &GrantSource) -> bool {
        let Some(permissions) = self.sources.remove(source) else {
            return false;
        };
        for flag in permissions.granted_flags() {
            if let Some(count) = self.tally.get_mut(&flag) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.tally.remove(&flag);
                }
            }
        }
        true
    }
}

/// Outcome of a write to one role edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    /// Grantee
    pub grantee: ProfileId,
    /// Boost the role applies to
    pub boost: BoostUri,
    /// Effective role after the write; `None` when the edge was deleted
    pub effective: Option<PermissionSet>,
}

impl RoleChange {
    /// Journal fact for this change at `now_ms`
    pub fn to_fact(&self, now_ms: u64) -> BoostFact {
        match &self.effective {
            Some(permissions) => BoostFact::RoleGranted {
                boost: self.boost.clone(),
                grantee: self.grantee.clone(),
                permissions: permissions.clone(),
                granted_at_ms: now_ms,
            },
            None => BoostFact::RoleRetracted {
                boost: self.boost.clone(),
                grantee: self.grantee.clone(),
                removed: true,
                retracted_at_ms: now_ms,
            },
        }
    }
}

/// All role edges
#[derive(Debug, Clone, Default)]
pub struct GrantStore {
    roles: HashMap<BoostUri, BTreeMap<ProfileId, RoleEdge>>,
    by_credential: HashMap<CredentialRef, BTreeSet<(ProfileId, BoostUri)>>,
}

impl GrantStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Role edge for (actor, boost)
    pub fn role(&self, actor: &ProfileId, boost: &BoostUri) -> Option<&RoleEdge> {
        self.roles.get(boost)?.get(actor)
    }

    /// Effective role for (actor, boost)
    pub fn effective(&self, actor: &ProfileId, boost: &BoostUri) -> Option<PermissionSet> {
        self.role(actor, boost).map(RoleEdge::effective)
    }

    /// Role edges on `boost`, ordered by profile id
    pub fn roles_on<'a>(
        &'a self,
        boost: &BoostUri,
    ) -> impl Iterator<Item = (&'a ProfileId, &'a RoleEdge)> + 'a {
        self.roles.get(boost).into_iter().flat_map(|edges| edges.iter())
    }

    /// Overwrite the explicit layer, deleting the edge if nothing remains
    pub fn set_explicit(
        &mut self,
        actor: &ProfileId,
        boost: &BoostUri,
        permissions: PermissionSet,
    ) -> RoleChange {
        let edges = self.roles.entry(boost.clone()).or_default();
        let edge = edges.entry(actor.clone()).or_default();
        edge.explicit = permissions;
        self.settle(actor, boost)
    }

    /// Add a contribution from `source`. Returns `None` if the source had
    /// already contributed to this edge.
    pub fn contribute(
        &mut self,
        actor: &ProfileId,
        boost: &BoostUri,
        source: GrantSource,
        permissions: PermissionSet,
    ) -> Option<RoleChange> {
        let credential = source.credential().clone();
        let edges = self.roles.entry(boost.clone()).or_default();
        let edge = edges.entry(actor.clone()).or_default();
        if !edge.contribute(source, permissions) {
            return None;
        }
        self.by_credential
            .entry(credential)
            .or_default()
            .insert((actor.clone(), boost.clone()));
        Some(self.settle(actor, boost))
    }

    /// Retract everything `credential` contributed, on every edge.
    ///
    /// Replaying the same retraction is a no-op returning no changes.
    pub fn retract_credential(&mut self, credential: &CredentialRef) -> Vec<RoleChange> {
        let Some(edges) = self.by_credential.remove(credential) else {
            return Vec::new();
        };

        let mut changes = Vec::new();
        for (actor, boost) in edges {
            let Some(edge) = self.roles.get_mut(&boost).and_then(|e| e.get_mut(&actor)) else {
                continue;
            };
            let governed: Vec<GrantSource> = edge
                .sources
                .keys()
                .filter(|source| source.credential() == credential)
                .cloned()
                .collect();
            let mut touched = false;
            for source in &governed {
                touched |= edge.retract(source);
            }
            if touched {
                changes.push(self.settle(&actor, &boost));
            }
        }
        changes
    }

    /// Number of role edges
    pub fn len(&self) -> usize {
        self.roles.values().map(BTreeMap::len).sum()
    }

    /// Whether no role edge exists
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn settle(&mut self, actor: &ProfileId, boost: &BoostUri) -> RoleChange {
        let mut effective = None;
        if let Some(edges) = self.roles.get_mut(boost) {
            match edges.get(actor) {
                Some(edge) if !edge.is_empty() => effective = Some(edge.effective()),
                _ => {
                    edges.remove(actor);
                }
            }
            if edges.is_empty() {
                self.roles.remove(boost);
            }
        }
        RoleChange {
            grantee: actor.clone(),
            boost: boost.clone(),
            effective,
        }
    }
}
