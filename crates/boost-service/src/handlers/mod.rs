//! Production effect handlers
//!
//! [`Effects`] bundles one handler per effect trait; any combination of
//! handlers satisfies [`boost_core::BoostEffects`], so tests swap in the
//! mocks from `boost-testkit` without touching the service.

pub mod credential;
pub mod identity;
pub mod time;

pub use credential::UnsignedCredentials;
pub use identity::LocalIdentity;
pub use time::SystemClock;

use async_trait::async_trait;
use boost_core::{
    BoostResult, CredentialEffects, CredentialPayload, IdentityEffects, PhysicalTimeEffects,
    ProfileId, SessionToken, SignedCredential,
};

/// One handler per effect
#[derive(Debug, Default)]
pub struct Effects<C, I, T> {
    /// Credential signing and verification
    pub credentials: C,
    /// Session resolution
    pub identity: I,
    /// Clock
    pub clock: T,
}

/// Handlers for a single-process deployment
pub type LocalEffects = Effects<UnsignedCredentials, LocalIdentity, SystemClock>;

impl<C, I, T> Effects<C, I, T> {
    /// Bundle the given handlers
    pub fn new(credentials: C, identity: I, clock: T) -> Self {
        Self {
            credentials,
            identity,
            clock,
        }
    }
}

#[async_trait]
impl<C, I, T> CredentialEffects for Effects<C, I, T>
where
    C: CredentialEffects,
    I: Send + Sync,
    T: Send + Sync,
{
    async fn sign(&self, payload: CredentialPayload) -> BoostResult<SignedCredential> {
        self.credentials.sign(payload).await
    }

    async fn verify(&self, credential: &SignedCredential) -> BoostResult<bool> {
        self.credentials.verify(credential).await
    }
}

#[async_trait]
impl<C, I, T> IdentityEffects for Effects<C, I, T>
where
    C: Send + Sync,
    I: IdentityEffects,
    T: Send + Sync,
{
    async fn resolve_actor(&self, token: &SessionToken) -> Option<ProfileId> {
        self.identity.resolve_actor(token).await
    }
}

#[async_trait]
impl<C, I, T> PhysicalTimeEffects for Effects<C, I, T>
where
    C: Send + Sync,
    I: Send + Sync,
    T: PhysicalTimeEffects,
{
    async fn now_ms(&self) -> u64 {
        self.clock.now_ms().await
    }
}
