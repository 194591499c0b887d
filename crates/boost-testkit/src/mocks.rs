//! Mock effect handlers
//!
//! Deterministic stand-ins for the production handlers in
//! `boost_service::handlers`.

use async_trait::async_trait;
use boost_core::{
    BoostResult, CredentialEffects, CredentialPayload, CredentialRef, IdentityEffects,
    PhysicalTimeEffects, ProfileId, SessionToken, SignedCredential,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Clock that advances by a fixed step on every read
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicU64,
    step_ms: u64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1_000, 1)
    }
}

impl ManualClock {
    /// Clock starting at `start_ms`, advancing `step_ms` per read
    pub fn new(start_ms: u64, step_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
            step_ms,
        }
    }

    /// Jump forward
    pub fn advance(&self, by_ms: u64) {
        self.now_ms.fetch_add(by_ms, Ordering::SeqCst);
    }

    /// Current reading without advancing
    pub fn peek(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PhysicalTimeEffects for ManualClock {
    async fn now_ms(&self) -> u64 {
        self.now_ms.fetch_add(self.step_ms, Ordering::SeqCst)
    }
}

/// Identity where a token names its actor.
///
/// By default any non-empty token resolves to the profile of the same
/// name, so `SessionToken::new("admin")` acts as `admin`. Explicit
/// bindings take precedence and expired tokens resolve to nobody.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    bindings: Mutex<HashMap<SessionToken, ProfileId>>,
    expired: Mutex<HashSet<SessionToken>>,
}

impl StaticIdentity {
    /// Identity with no explicit bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `token` to `actor`
    pub fn bind(&self, token: SessionToken, actor: ProfileId) {
        self.bindings.lock().insert(token, actor);
    }

    /// Make `token` resolve to nobody
    pub fn expire(&self, token: SessionToken) {
        self.expired.lock().insert(token);
    }
}

#[async_trait]
impl IdentityEffects for StaticIdentity {
    async fn resolve_actor(&self, token: &SessionToken) -> Option<ProfileId> {
        if token.as_str().is_empty() || self.expired.lock().contains(token) {
            return None;
        }
        let bound = self.bindings.lock().get(token).cloned();
        Some(bound.unwrap_or_else(|| ProfileId::new(token.as_str())))
    }
}

/// Credential handler that accepts everything it has not been told to reject
#[derive(Debug, Default)]
pub struct MockCredentials {
    rejected: Mutex<HashSet<CredentialRef>>,
    signed: Mutex<Vec<CredentialRef>>,
}

impl MockCredentials {
    /// Handler accepting every credential
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail verification for `credential`
    pub fn reject(&self, credential: CredentialRef) {
        self.rejected.lock().insert(credential);
    }

    /// Credentials signed so far, in order
    pub fn signed(&self) -> Vec<CredentialRef> {
        self.signed.lock().clone()
    }

    /// Envelope this handler would produce for `payload`
    pub fn envelope(payload: CredentialPayload) -> SignedCredential {
        SignedCredential {
            proof: format!("mock:{}", payload.id),
            payload,
        }
    }
}

#[async_trait]
impl CredentialEffects for MockCredentials {
    async fn sign(&self, payload: CredentialPayload) -> BoostResult<SignedCredential> {
        self.signed.lock().push(payload.id.clone());
        Ok(Self::envelope(payload))
    }

    async fn verify(&self, credential: &SignedCredential) -> BoostResult<bool> {
        Ok(!self.rejected.lock().contains(credential.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clock_steps_on_every_read() {
        let clock = ManualClock::new(10, 5);
        assert_eq!(clock.now_ms().await, 10);
        assert_eq!(clock.now_ms().await, 15);
        clock.advance(100);
        assert_eq!(clock.peek(), 120);
    }

    #[tokio::test]
    async fn identity_defaults_to_token_name() {
        let identity = StaticIdentity::new();
        let admin = SessionToken::new("admin");
        assert_eq!(
            identity.resolve_actor(&admin).await,
            Some(ProfileId::new("admin"))
        );
        assert!(identity.resolve_actor(&SessionToken::new("")).await.is_none());

        identity.expire(admin.clone());
        assert!(identity.resolve_actor(&admin).await.is_none());
    }
}
