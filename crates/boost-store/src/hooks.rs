//! Claim hook registry
//!
//! Hooks are stored rules, not relationships: nothing is materialized until a
//! credential under the hook's claim boost is claimed.

use boost_core::{BoostError, BoostResult, BoostUri, HookId, PermissionSet, ProfileId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a hook grants when it fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HookKind {
    /// Grant a permission set on the target boost
    GrantPermissions {
        /// Permissions to grant
        permissions: PermissionSet,
    },
    /// Make the claimant an admin of the target boost
    AddAdmin,
}

impl HookKind {
    /// Permission set this hook contributes
    pub fn permissions(&self) -> PermissionSet {
        match self {
            HookKind::GrantPermissions { permissions } => permissions.clone(),
            HookKind::AddAdmin => PermissionSet::admin(),
        }
    }
}

/// Registered claim hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimHook {
    /// Hook id
    pub id: HookId,
    /// Trigger boost
    pub claim_uri: BoostUri,
    /// Boost receiving the grant
    pub target_uri: BoostUri,
    /// Grant kind
    #[serde(flatten)]
    pub kind: HookKind,
    /// Registering profile
    pub created_by: ProfileId,
    /// Creation time
    pub created_at: u64,
    /// Last modification time
    pub updated_at: u64,
}

impl ClaimHook {
    /// Whether `other` would grant exactly what `self` grants
    pub fn same_rule(&self, other: &ClaimHook) -> bool {
        self.claim_uri == other.claim_uri
            && self.target_uri == other.target_uri
            && self.kind == other.kind
    }
}

/// Hooks indexed by id and by claim boost
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<HookId, ClaimHook>,
    by_claim: HashMap<BoostUri, Vec<HookId>>,
}

impl HookRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a hook
    pub fn get(&self, id: &HookId) -> Option<&ClaimHook> {
        self.hooks.get(id)
    }

    /// Register a hook; `Conflict` if the id or the rule is already present
    pub fn insert(&mut self, hook: ClaimHook) -> BoostResult<()> {
        if self.hooks.contains_key(&hook.id) {
            return Err(BoostError::conflict(format!("Hook {} already exists", hook.id)));
        }
        if self.for_claim(&hook.claim_uri).any(|existing| existing.same_rule(&hook)) {
            return Err(BoostError::conflict(format!(
                "An identical hook already exists on {}",
                hook.claim_uri
            )));
        }
        self.by_claim
            .entry(hook.claim_uri.clone())
            .or_default()
            .push(hook.id);
        self.hooks.insert(hook.id, hook);
        Ok(())
    }

    /// Remove a hook, returning it
    pub fn remove(&mut self, id: &HookId) -> Option<ClaimHook> {
        let hook = self.hooks.remove(id)?;
        if let Some(ids) = self.by_claim.get_mut(&hook.claim_uri) {
            ids.retain(|h| h != id);
            if ids.is_empty() {
                self.by_claim.remove(&hook.claim_uri);
            }
        }
        Some(hook)
    }

    /// Hooks triggered by `claim_uri`, in registration order
    pub fn for_claim<'a>(&'a self, claim_uri: &BoostUri) -> impl Iterator<Item = &'a ClaimHook> + 'a {
        self.by_claim
            .get(claim_uri)
            .into_iter()
            .flatten()
            .filter_map(|id| self.hooks.get(id))
    }

    /// Number of hooks triggered by `claim_uri`
    pub fn count_for_claim(&self, claim_uri: &BoostUri) -> usize {
        self.by_claim.get(claim_uri).map_or(0, Vec::len)
    }

    /// Total registered hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hook is registered
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
