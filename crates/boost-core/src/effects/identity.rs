//! Session to actor resolution

use crate::identifiers::{ProfileId, SessionToken};
use async_trait::async_trait;

/// Resolves a caller's session into an actor
#[async_trait]
pub trait IdentityEffects: Send + Sync {
    /// Actor behind `token`, or `None` for an unauthenticated caller
    async fn resolve_actor(&self, token: &SessionToken) -> Option<ProfileId>;
}
