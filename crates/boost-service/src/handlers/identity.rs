//! Local session registry
//!
//! Maps opaque session tokens to profile handles for a single-process
//! deployment. Real deployments put their own authentication behind
//! [`IdentityEffects`].

use async_trait::async_trait;
use boost_core::{IdentityEffects, ProfileId, SessionToken};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// In-process session table
#[derive(Debug, Default)]
pub struct LocalIdentity {
    sessions: RwLock<HashMap<SessionToken, ProfileId>>,
}

impl LocalIdentity {
    /// Empty session table
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `actor` and return its token
    pub fn login(&self, actor: ProfileId) -> SessionToken {
        let token = SessionToken::new(Uuid::new_v4().to_string());
        debug!(%actor, "session opened");
        self.sessions.write().insert(token.clone(), actor);
        token
    }

    /// Close a session. Returns whether it was open.
    pub fn logout(&self, token: &SessionToken) -> bool {
        self.sessions.write().remove(token).is_some()
    }
}

#[async_trait]
impl IdentityEffects for LocalIdentity {
    async fn resolve_actor(&self, token: &SessionToken) -> Option<ProfileId> {
        self.sessions.read().get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_then_logout() {
        let identity = LocalIdentity::new();
        let token = identity.login(ProfileId::new("admin"));
        let actor = futures::executor::block_on(identity.resolve_actor(&token));
        assert_eq!(actor, Some(ProfileId::new("admin")));

        assert!(identity.logout(&token));
        assert!(!identity.logout(&token));
        assert!(futures::executor::block_on(identity.resolve_actor(&token)).is_none());
    }
}
