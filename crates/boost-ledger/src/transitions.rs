//! Issuance state transitions
//!
//! `Issued -> Claimed -> Revoked`, or `Issued -> Revoked`. Each transition
//! runs inside the caller's store transaction and notifies the lifecycle
//! hooks in that same transaction, so a claimed credential never exists
//! without its grants and a revoked one never keeps them.

use boost_authorization::PermissionResolver;
use boost_core::{
    BoostError, BoostFact, BoostResult, BoostUri, Capability, CredentialRef, ProfileId,
};
use boost_store::{IssuanceRecord, IssuanceStatus, StoreState};
use tracing::{debug, info};

/// Observer of credential lifecycle events
pub trait LifecycleHooks: Send + Sync {
    /// A credential moved to `Claimed`
    fn credential_claimed(
        &self,
        state: &mut StoreState,
        record: &IssuanceRecord,
        now_ms: u64,
    ) -> BoostResult<()>;

    /// A credential moved to `Revoked`
    fn credential_revoked(
        &self,
        state: &mut StoreState,
        record: &IssuanceRecord,
        now_ms: u64,
    ) -> BoostResult<()>;
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl LifecycleHooks for NoHooks {
    fn credential_claimed(&self, _: &mut StoreState, _: &IssuanceRecord, _: u64) -> BoostResult<()> {
        Ok(())
    }

    fn credential_revoked(&self, _: &mut StoreState, _: &IssuanceRecord, _: u64) -> BoostResult<()> {
        Ok(())
    }
}

/// A credential about to be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    /// Boost issued under
    pub boost: BoostUri,
    /// Issuer
    pub issuer: ProfileId,
    /// Recipient
    pub recipient: ProfileId,
    /// Credential reference
    pub credential: CredentialRef,
}

/// Issuance ledger
#[derive(Debug, Clone, Default)]
pub struct IssuanceLedger<H> {
    hooks: H,
}

impl<H: LifecycleHooks> IssuanceLedger<H> {
    /// Ledger notifying `hooks` on claim and revoke
    pub fn new(hooks: H) -> Self {
        Self { hooks }
    }

    /// Lifecycle hooks in use
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Record a new issuance after checking the issuer may issue.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown boost or recipient, `Unauthorized` if the
    /// issuer lacks `issue`, `Conflict` if the credential is already tracked.
    pub fn send(
        &self,
        state: &mut StoreState,
        issuance: Issuance,
        now_ms: u64,
    ) -> BoostResult<IssuanceRecord> {
        state.graph.require(&issuance.boost)?;
        PermissionResolver::over(state).require(
            &issuance.issuer,
            &issuance.boost,
            Capability::Issue,
        )?;
        state.profiles.require(&issuance.recipient)?;

        let record = IssuanceRecord::issued(
            issuance.boost,
            issuance.issuer,
            issuance.recipient,
            issuance.credential,
            now_ms,
        );
        state.issuances.insert(record.clone())?;
        state.record(BoostFact::CredentialIssued {
            issuance: record.id,
            boost: record.boost_uri.clone(),
            from: record.from.clone(),
            to: record.to.clone(),
            credential: record.credential.clone(),
            issued_at_ms: now_ms,
        });
        info!(
            boost = %record.boost_uri,
            from = %record.from,
            to = %record.to,
            credential = %record.credential,
            "credential issued"
        );
        Ok(record)
    }

    /// Mark a credential claimed by its recipient.
    ///
    /// Claiming an already claimed credential is a no-op returning the record.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown credential, `Unauthorized` if `claimant` is
    /// not the recipient, `BadRequest` if the credential was revoked.
    pub fn claim(
        &self,
        state: &mut StoreState,
        claimant: &ProfileId,
        credential: &CredentialRef,
        now_ms: u64,
    ) -> BoostResult<IssuanceRecord> {
        let record = state
            .issuances
            .by_credential(credential)
            .cloned()
            .ok_or_else(|| BoostError::not_found(format!("Credential not found: {credential}")))?;

        if &record.to != claimant {
            return Err(BoostError::unauthorized(format!(
                "{claimant} is not the recipient of {credential}"
            )));
        }
        match record.status {
            IssuanceStatus::Revoked => {
                return Err(BoostError::bad_request(format!(
                    "Credential has been revoked: {credential}"
                )));
            }
            IssuanceStatus::Claimed => {
                debug!(%credential, "credential already claimed");
                return Ok(record);
            }
            IssuanceStatus::Issued => {}
        }

        let claimed = self.transition(state, &record, IssuanceStatus::Claimed, now_ms)?;
        state.record(BoostFact::CredentialClaimed {
            issuance: claimed.id,
            boost: claimed.boost_uri.clone(),
            recipient: claimed.to.clone(),
            claimed_at_ms: now_ms,
        });
        self.hooks.credential_claimed(state, &claimed, now_ms)?;
        info!(boost = %claimed.boost_uri, recipient = %claimed.to, %credential, "credential claimed");
        Ok(claimed)
    }

    /// Revoke every record of `recipient` under `boost`.
    ///
    /// Returns the records revoked by this call; already revoked records are
    /// left alone and do not fire hooks again, so repeating the call is a
    /// successful no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown boost or when the pair has no records,
    /// `Unauthorized` if `actor` lacks `revoke`.
    pub fn revoke_recipient(
        &self,
        state: &mut StoreState,
        actor: &ProfileId,
        boost: &BoostUri,
        recipient: &ProfileId,
        now_ms: u64,
    ) -> BoostResult<Vec<IssuanceRecord>> {
        state.graph.require(boost)?;
        PermissionResolver::over(state).require(actor, boost, Capability::Revoke)?;

        let ids = state.issuances.for_pair(boost, recipient);
        if ids.is_empty() {
            return Err(BoostError::not_found(format!(
                "{recipient} holds no credential issued under {boost}"
            )));
        }

        let mut revoked = Vec::new();
        for id in ids {
            let Some(record) = state.issuances.get(&id).cloned() else {
                continue;
            };
            if record.is_revoked() {
                continue;
            }
            let record = self.transition(state, &record, IssuanceStatus::Revoked, now_ms)?;
            state.record(BoostFact::CredentialRevoked {
                issuance: record.id,
                boost: record.boost_uri.clone(),
                recipient: record.to.clone(),
                revoker: actor.clone(),
                revoked_at_ms: now_ms,
            });
            self.hooks.credential_revoked(state, &record, now_ms)?;
            revoked.push(record);
        }

        if revoked.is_empty() {
            debug!(%boost, %recipient, "already revoked");
        } else {
            info!(%boost, %recipient, count = revoked.len(), "credentials revoked");
        }
        Ok(revoked)
    }

    fn transition(
        &self,
        state: &mut StoreState,
        record: &IssuanceRecord,
        status: IssuanceStatus,
        now_ms: u64,
    ) -> BoostResult<IssuanceRecord> {
        let stored = state
            .issuances
            .get_mut(&record.id)
            .ok_or_else(|| BoostError::internal(format!("Issuance vanished: {}", record.id)))?;
        stored.status = status;
        match status {
            IssuanceStatus::Claimed => stored.claimed_at = Some(now_ms),
            IssuanceStatus::Revoked => stored.revoked_at = Some(now_ms),
            IssuanceStatus::Issued => {}
        }
        Ok(stored.clone())
    }
}
