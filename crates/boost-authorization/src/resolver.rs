//! Permission resolver
//!
//! Decides whether an actor may exercise one capability on one boost. Rules
//! are tried in order and the first match wins:
//!
//! 1. a direct role on the boost granting the capability;
//! 2. the boost's default policy, for capabilities policy may confer;
//! 3. a role on any ancestor whose children variant of the capability covers
//!    the boost, at any distance;
//! 4. otherwise deny.
//!
//! The resolver is pure over a store snapshot and never fails. An unknown
//! boost simply has no roles, policy or ancestors and is denied; callers
//! report it as not found before asking.

use boost_core::{
    BoostError, BoostResult, BoostUri, Capability, JoinSemilattice, PermissionSet, ProfileId,
};
use boost_store::{BoostGraph, GrantStore, StoreState};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Capabilities a default policy can grant to any authenticated actor
pub const POLICY_CAPABILITIES: &[Capability] = &[Capability::Issue];

/// Why a request was allowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grounds {
    /// The actor's own role on the boost
    DirectRole,
    /// The boost's default policy
    DefaultPolicy,
    /// A delegation flag held on an ancestor
    AncestorDelegation {
        /// Ancestor carrying the delegating role
        ancestor: BoostUri,
    },
}

/// Resolver outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Access granted
    Allow(Grounds),
    /// Access denied
    Deny,
}

impl Decision {
    /// Whether access was granted
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// Read-only resolver over a graph and grant store
#[derive(Debug, Clone, Copy)]
pub struct PermissionResolver<'a> {
    graph: &'a BoostGraph,
    grants: &'a GrantStore,
}

impl<'a> PermissionResolver<'a> {
    /// Resolver over explicit components
    pub fn new(graph: &'a BoostGraph, grants: &'a GrantStore) -> Self {
        Self { graph, grants }
    }

    /// Resolver over a store snapshot
    pub fn over(state: &'a StoreState) -> Self {
        Self::new(&state.graph, &state.grants)
    }

    /// Decide whether `actor` holds `capability` on `boost`
    pub fn resolve(&self, actor: &ProfileId, boost: &BoostUri, capability: Capability) -> Decision {
        let decision = self.decide(actor, boost, capability);
        debug!(%actor, %boost, %capability, ?decision, "permission resolved");
        decision
    }

    /// Like [`resolve`](Self::resolve), mapping a denial to `Unauthorized`
    pub fn require(
        &self,
        actor: &ProfileId,
        boost: &BoostUri,
        capability: Capability,
    ) -> BoostResult<Grounds> {
        match self.resolve(actor, boost, capability) {
            Decision::Allow(grounds) => Ok(grounds),
            Decision::Deny => Err(BoostError::unauthorized(format!(
                "{actor} lacks {capability} on {boost}"
            ))),
        }
    }

    fn decide(&self, actor: &ProfileId, boost: &BoostUri, capability: Capability) -> Decision {
        if let Some(role) = self.grants.effective(actor, boost) {
            if role.grants(capability, boost) {
                return Decision::Allow(Grounds::DirectRole);
            }
        }

        if POLICY_CAPABILITIES.contains(&capability) {
            let policy = self
                .graph
                .get(boost)
                .and_then(|node| node.default_permissions.as_ref());
            if policy.is_some_and(|policy| policy.flag(capability)) {
                return Decision::Allow(Grounds::DefaultPolicy);
            }
        }

        let Some(delegated) = capability.children_variant() else {
            return Decision::Deny;
        };
        for ancestor in self.graph.ancestors(boost) {
            let covers = self
                .grants
                .effective(actor, &ancestor.uri)
                .and_then(|role| role.scope(delegated).map(|scope| scope.covers(boost)))
                .unwrap_or(false);
            if covers {
                return Decision::Allow(Grounds::AncestorDelegation {
                    ancestor: ancestor.uri.clone(),
                });
            }
        }

        Decision::Deny
    }

    /// Permission set `actor` effectively holds at `boost`.
    ///
    /// For every capability `c`, `effective_permissions(a, b).grants(c, b)`
    /// equals `resolve(a, b, c).is_allowed()`.
    pub fn effective_permissions(&self, actor: &ProfileId, boost: &BoostUri) -> PermissionSet {
        let mut held = self.grants.effective(actor, boost).unwrap_or_default();

        if let Some(policy) = self
            .graph
            .get(boost)
            .and_then(|node| node.default_permissions.as_ref())
        {
            for &capability in POLICY_CAPABILITIES {
                if policy.flag(capability) {
                    held.set_flag(capability, true);
                }
            }
        }

        for ancestor in self.graph.ancestors(boost) {
            let Some(role) = self.grants.effective(actor, &ancestor.uri) else {
                continue;
            };
            for capability in Capability::ALL {
                let Some(delegated) = capability.children_variant() else {
                    continue;
                };
                let Some(scope) = role.scope(delegated) else {
                    continue;
                };
                if capability.is_delegation() {
                    let widened = held.scope(capability).map(|mine| mine.join(scope));
                    if let Some(widened) = widened {
                        held.set_scope(capability, widened);
                    }
                } else if scope.covers(boost) {
                    held.set_flag(capability, true);
                }
            }
        }

        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boost_core::ChildScope;
    use boost_store::{Boost, BoostPayload};

    fn uri(id: &str) -> BoostUri {
        BoostUri::new("example.org", id)
    }

    fn state() -> StoreState {
        let mut state = StoreState::new();
        let admin = ProfileId::new("admin");
        let network = Boost::new(uri("network"), admin.clone(), BoostPayload::default(), 0)
            .with_default_permissions(Some(PermissionSet {
                can_issue: true,
                ..PermissionSet::empty()
            }));
        let troop = Boost::new(uri("troop"), admin.clone(), BoostPayload::default(), 0)
            .with_parent(uri("network"));
        let scout = Boost::new(uri("scout"), admin, BoostPayload::default(), 0)
            .with_parent(uri("troop"));
        state.graph.insert(network).unwrap();
        state.graph.insert(troop).unwrap();
        state.graph.insert(scout).unwrap();
        state
    }

    #[test]
    fn direct_role_allows() {
        let mut state = state();
        let actor = ProfileId::new("editor");
        state.grants.set_explicit(
            &actor,
            &uri("troop"),
            PermissionSet {
                can_edit: true,
                ..PermissionSet::empty()
            },
        );
        let resolver = PermissionResolver::over(&state);
        assert_eq!(
            resolver.resolve(&actor, &uri("troop"), Capability::Edit),
            Decision::Allow(Grounds::DirectRole)
        );
        assert_eq!(
            resolver.resolve(&actor, &uri("troop"), Capability::Issue),
            Decision::Deny
        );
    }

    #[test]
    fn default_policy_grants_issue_only() {
        let state = state();
        let anyone = ProfileId::new("anyone");
        let resolver = PermissionResolver::over(&state);
        assert_eq!(
            resolver.resolve(&anyone, &uri("network"), Capability::Issue),
            Decision::Allow(Grounds::DefaultPolicy)
        );
        assert!(!resolver
            .resolve(&anyone, &uri("network"), Capability::Edit)
            .is_allowed());
        // not inherited
        assert!(!resolver
            .resolve(&anyone, &uri("troop"), Capability::Issue)
            .is_allowed());
    }

    #[test]
    fn wildcard_delegation_skips_generations() {
        let mut state = state();
        let leader = ProfileId::new("leader");
        state.grants.set_explicit(
            &leader,
            &uri("network"),
            PermissionSet {
                can_issue_children: ChildScope::All,
                ..PermissionSet::empty()
            },
        );
        let resolver = PermissionResolver::over(&state);
        assert_eq!(
            resolver.resolve(&leader, &uri("scout"), Capability::Issue),
            Decision::Allow(Grounds::AncestorDelegation {
                ancestor: uri("network")
            })
        );
        assert!(!resolver
            .resolve(&leader, &uri("scout"), Capability::Revoke)
            .is_allowed());
    }

    #[test]
    fn explicit_delegation_lists_targets() {
        let mut state = state();
        let leader = ProfileId::new("leader");
        state.grants.set_explicit(
            &leader,
            &uri("network"),
            PermissionSet {
                can_edit_children: ChildScope::explicit([uri("scout")]),
                ..PermissionSet::empty()
            },
        );
        let resolver = PermissionResolver::over(&state);
        assert!(resolver
            .resolve(&leader, &uri("scout"), Capability::Edit)
            .is_allowed());
        assert!(!resolver
            .resolve(&leader, &uri("troop"), Capability::Edit)
            .is_allowed());
    }

    #[test]
    fn unknown_boost_is_denied() {
        let state = state();
        let resolver = PermissionResolver::over(&state);
        let err = resolver
            .require(&ProfileId::new("admin"), &uri("missing"), Capability::Edit)
            .unwrap_err();
        assert!(matches!(err, BoostError::Unauthorized { .. }));
    }

    #[test]
    fn effective_permissions_merge_all_sources() {
        let mut state = state();
        let leader = ProfileId::new("leader");
        state.grants.set_explicit(
            &leader,
            &uri("network"),
            PermissionSet {
                can_revoke_children: ChildScope::All,
                ..PermissionSet::empty()
            },
        );
        state.grants.set_explicit(
            &leader,
            &uri("scout"),
            PermissionSet {
                can_view_analytics: true,
                ..PermissionSet::empty()
            },
        );
        let held = PermissionResolver::over(&state).effective_permissions(&leader, &uri("scout"));
        assert!(held.can_revoke);
        assert!(held.can_view_analytics);
        assert_eq!(held.can_revoke_children, ChildScope::All);
        assert!(!held.can_issue);
    }
}
