//! Escalation guard
//!
//! A caller may only hand out what it holds. Every flag named in a
//! permission update must be held by the caller at the same boost: boolean
//! flags must be true for the caller, and a delegation scope must be
//! contained in the caller's own resolved scope.

use crate::resolver::PermissionResolver;
use boost_core::{BoostError, BoostResult, BoostUri, FlagUpdate, PermissionUpdate, ProfileId};
use tracing::debug;

impl PermissionResolver<'_> {
    /// Fail with `Unauthorized` unless `actor` holds every flag `update` names
    pub fn ensure_can_grant(
        &self,
        actor: &ProfileId,
        boost: &BoostUri,
        update: &PermissionUpdate,
    ) -> BoostResult<()> {
        let held = self.effective_permissions(actor, boost);
        for entry in update.entries() {
            let allowed = match &entry {
                FlagUpdate::Flag(capability, _) => held.flag(*capability),
                FlagUpdate::Scope(capability, scope) => held
                    .scope(*capability)
                    .is_some_and(|mine| mine.contains(scope)),
            };
            if !allowed {
                debug!(%actor, %boost, ?entry, "escalation refused");
                return Err(BoostError::unauthorized(format!(
                    "{actor} cannot grant {entry:?} on {boost} without holding it"
                )));
            }
        }
        Ok(())
    }
}
