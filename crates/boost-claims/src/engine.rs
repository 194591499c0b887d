//! Claim hook engine
//!
//! Registers hooks after validating them, and applies or retracts their
//! grants when the issuance ledger reports a claim or a revocation.
//!
//! Grants are contributed with their provenance (hook id and credential), so
//! retraction is keyed by the credential alone: revoking one credential pulls
//! exactly what it contributed, even if the hook has since been deleted, and
//! leaves grants from other credentials in place.

use boost_authorization::PermissionResolver;
use boost_core::{
    BoostError, BoostFact, BoostResult, BoostUri, Capability, HookId, PermissionUpdate, ProfileId,
};
use boost_ledger::LifecycleHooks;
use boost_store::{ClaimHook, GrantSource, HookKind, IssuanceRecord, StoreState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Default cap on hooks per claim boost
pub const DEFAULT_MAX_HOOKS_PER_BOOST: usize = 32;

/// Hook registration request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClaimHook {
    /// Trigger boost
    pub claim_uri: BoostUri,
    /// Boost receiving the grant
    pub target_uri: BoostUri,
    /// What to grant
    #[serde(flatten)]
    pub kind: HookKind,
}

/// Claim hook engine
#[derive(Debug, Clone)]
pub struct ClaimHookEngine {
    max_hooks_per_boost: usize,
}

impl Default for ClaimHookEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HOOKS_PER_BOOST)
    }
}

impl ClaimHookEngine {
    /// Engine allowing at most `max_hooks_per_boost` hooks per claim boost
    pub fn new(max_hooks_per_boost: usize) -> Self {
        Self {
            max_hooks_per_boost,
        }
    }

    /// Validate and register a hook on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if either boost does not exist
    /// - `Unauthorized` if `actor` cannot manage permissions on the claim
    ///   boost, or cannot hand out the hook's grant on the target
    /// - `BadRequest` for an empty grant or too many hooks on the claim boost
    /// - `Conflict` for an identical existing hook
    pub fn register(
        &self,
        state: &mut StoreState,
        actor: &ProfileId,
        request: NewClaimHook,
        now_ms: u64,
    ) -> BoostResult<ClaimHook> {
        state.graph.require(&request.claim_uri)?;
        state.graph.require(&request.target_uri)?;

        let resolver = PermissionResolver::over(state);
        resolver.require(actor, &request.claim_uri, Capability::ManagePermissions)?;
        match &request.kind {
            HookKind::GrantPermissions { permissions } => {
                if permissions.is_empty() {
                    return Err(BoostError::bad_request("Claim hook grants no permissions"));
                }
                resolver.require(actor, &request.target_uri, Capability::ManagePermissions)?;
                resolver.ensure_can_grant(
                    actor,
                    &request.target_uri,
                    &PermissionUpdate::from(permissions),
                )?;
            }
            HookKind::AddAdmin => {
                if !resolver
                    .effective_permissions(actor, &request.target_uri)
                    .is_admin()
                {
                    return Err(BoostError::unauthorized(format!(
                        "{actor} is not an admin of {}",
                        request.target_uri
                    )));
                }
            }
        }

        if state.hooks.count_for_claim(&request.claim_uri) >= self.max_hooks_per_boost {
            return Err(BoostError::bad_request(format!(
                "{} already has the maximum of {} claim hooks",
                request.claim_uri, self.max_hooks_per_boost
            )));
        }

        let hook = ClaimHook {
            id: HookId::new(),
            claim_uri: request.claim_uri,
            target_uri: request.target_uri,
            kind: request.kind,
            created_by: actor.clone(),
            created_at: now_ms,
            updated_at: now_ms,
        };
        state.hooks.insert(hook.clone())?;
        state.record(BoostFact::HookCreated {
            hook_id: hook.id,
            claim_uri: hook.claim_uri.clone(),
            target_uri: hook.target_uri.clone(),
            created_at_ms: now_ms,
        });
        info!(
            hook_id = %hook.id,
            claim = %hook.claim_uri,
            target = %hook.target_uri,
            %actor,
            "claim hook registered"
        );
        Ok(hook)
    }

    /// Remove a hook on behalf of `actor`.
    ///
    /// Grants the hook already made stay until their credential is revoked.
    pub fn delete(
        &self,
        state: &mut StoreState,
        actor: &ProfileId,
        hook_id: &HookId,
        now_ms: u64,
    ) -> BoostResult<ClaimHook> {
        let claim_uri = state
            .hooks
            .get(hook_id)
            .map(|hook| hook.claim_uri.clone())
            .ok_or_else(|| BoostError::not_found(format!("Claim hook not found: {hook_id}")))?;
        PermissionResolver::over(state).require(actor, &claim_uri, Capability::ManagePermissions)?;

        let hook = state
            .hooks
            .remove(hook_id)
            .ok_or_else(|| BoostError::not_found(format!("Claim hook not found: {hook_id}")))?;
        state.record(BoostFact::HookDeleted {
            hook_id: hook.id,
            claim_uri: hook.claim_uri.clone(),
            deleted_at_ms: now_ms,
        });
        info!(hook_id = %hook.id, claim = %hook.claim_uri, %actor, "claim hook deleted");
        Ok(hook)
    }

    /// Hooks triggered by `claim_uri`, in registration order
    pub fn hooks_for(state: &StoreState, claim_uri: &BoostUri) -> Vec<ClaimHook> {
        state.hooks.for_claim(claim_uri).cloned().collect()
    }
}

impl LifecycleHooks for ClaimHookEngine {
    fn credential_claimed(
        &self,
        state: &mut StoreState,
        record: &IssuanceRecord,
        now_ms: u64,
    ) -> BoostResult<()> {
        let hooks = Self::hooks_for(state, &record.boost_uri);
        for hook in hooks {
            if !state.graph.contains(&hook.target_uri) {
                warn!(
                    hook_id = %hook.id,
                    target = %hook.target_uri,
                    "claim hook target missing; skipping"
                );
                continue;
            }
            let source = GrantSource::Hook {
                hook_id: hook.id,
                credential: record.credential.clone(),
            };
            if let Some(change) =
                state
                    .grants
                    .contribute(&record.to, &hook.target_uri, source, hook.kind.permissions())
            {
                debug!(hook_id = %hook.id, grantee = %record.to, target = %hook.target_uri, "claim hook applied");
                state.record(change.to_fact(now_ms));
            }
        }

        let claim_role = state
            .graph
            .get(&record.boost_uri)
            .and_then(|boost| boost.claim_permissions.clone())
            .filter(|permissions| !permissions.is_empty());
        if let Some(permissions) = claim_role {
            let source = GrantSource::ClaimRole {
                credential: record.credential.clone(),
            };
            if let Some(change) =
                state
                    .grants
                    .contribute(&record.to, &record.boost_uri, source, permissions)
            {
                debug!(grantee = %record.to, boost = %record.boost_uri, "claim role applied");
                state.record(change.to_fact(now_ms));
            }
        }
        Ok(())
    }

    fn credential_revoked(
        &self,
        state: &mut StoreState,
        record: &IssuanceRecord,
        now_ms: u64,
    ) -> BoostResult<()> {
        let changes = state.grants.retract_credential(&record.credential);
        for change in &changes {
            debug!(
                grantee = %change.grantee,
                boost = %change.boost,
                removed = change.effective.is_none(),
                "claim grant retracted"
            );
            let fact = BoostFact::RoleRetracted {
                boost: change.boost.clone(),
                grantee: change.grantee.clone(),
                removed: change.effective.is_none(),
                retracted_at_ms: now_ms,
            };
            state.record(fact);
        }
        Ok(())
    }
}
