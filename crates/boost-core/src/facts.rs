//! Boost domain facts
//!
//! Every committed mutation appends one fact to the store journal inside the
//! same transaction, so the journal is an audit trail that never disagrees
//! with the state it describes.

use crate::identifiers::{BoostUri, CredentialRef, HookId, IssuanceId, ProfileId};
use crate::permissions::PermissionSet;
use crate::{BoostError, BoostResult};
use serde::{Deserialize, Serialize};

/// Schema version for encoded boost facts
pub const BOOST_FACT_SCHEMA_VERSION: u16 = 1;

/// Journal entry describing one committed state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum BoostFact {
    /// Boost node created
    BoostCreated {
        /// New boost
        boost: BoostUri,
        /// Parent, for child boosts
        parent: Option<BoostUri>,
        /// Creating profile
        creator: ProfileId,
        /// Commit time
        created_at_ms: u64,
    },

    /// Boost payload or policy edited
    BoostUpdated {
        /// Edited boost
        boost: BoostUri,
        /// Editing profile
        editor: ProfileId,
        /// Commit time
        updated_at_ms: u64,
    },

    /// Parent edge added or removed
    BoostReparented {
        /// Child boost
        boost: BoostUri,
        /// New parent, `None` when detached
        parent: Option<BoostUri>,
        /// Acting profile
        actor: ProfileId,
        /// Commit time
        reparented_at_ms: u64,
    },

    /// Role written or widened
    RoleGranted {
        /// Boost the role applies to
        boost: BoostUri,
        /// Grantee
        grantee: ProfileId,
        /// Resulting effective role
        permissions: PermissionSet,
        /// Commit time
        granted_at_ms: u64,
    },

    /// Role narrowed or deleted
    RoleRetracted {
        /// Boost the role applied to
        boost: BoostUri,
        /// Former grantee
        grantee: ProfileId,
        /// Whether the role edge was removed entirely
        removed: bool,
        /// Commit time
        retracted_at_ms: u64,
    },

    /// Claim hook registered
    HookCreated {
        /// New hook
        hook_id: HookId,
        /// Trigger boost
        claim_uri: BoostUri,
        /// Boost receiving grants
        target_uri: BoostUri,
        /// Commit time
        created_at_ms: u64,
    },

    /// Claim hook removed
    HookDeleted {
        /// Removed hook
        hook_id: HookId,
        /// Trigger boost
        claim_uri: BoostUri,
        /// Commit time
        deleted_at_ms: u64,
    },

    /// Credential issued under a boost
    CredentialIssued {
        /// Ledger record
        issuance: IssuanceId,
        /// Boost issued under
        boost: BoostUri,
        /// Issuer
        from: ProfileId,
        /// Recipient
        to: ProfileId,
        /// Issued credential
        credential: CredentialRef,
        /// Commit time
        issued_at_ms: u64,
    },

    /// Credential claimed by its recipient
    CredentialClaimed {
        /// Ledger record
        issuance: IssuanceId,
        /// Boost issued under
        boost: BoostUri,
        /// Claimant
        recipient: ProfileId,
        /// Commit time
        claimed_at_ms: u64,
    },

    /// Credential revoked
    CredentialRevoked {
        /// Ledger record
        issuance: IssuanceId,
        /// Boost issued under
        boost: BoostUri,
        /// Former holder
        recipient: ProfileId,
        /// Revoking profile
        revoker: ProfileId,
        /// Commit time
        revoked_at_ms: u64,
    },
}

impl BoostFact {
    /// Boost this fact concerns
    pub fn boost_uri(&self) -> &BoostUri {
        match self {
            BoostFact::BoostCreated { boost, .. }
            | BoostFact::BoostUpdated { boost, .. }
            | BoostFact::BoostReparented { boost, .. }
            | BoostFact::RoleGranted { boost, .. }
            | BoostFact::RoleRetracted { boost, .. }
            | BoostFact::CredentialIssued { boost, .. }
            | BoostFact::CredentialClaimed { boost, .. }
            | BoostFact::CredentialRevoked { boost, .. } => boost,
            BoostFact::HookCreated { claim_uri, .. } | BoostFact::HookDeleted { claim_uri, .. } => {
                claim_uri
            }
        }
    }

    /// Get the timestamp for this fact in milliseconds
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            BoostFact::BoostCreated { created_at_ms, .. } => *created_at_ms,
            BoostFact::BoostUpdated { updated_at_ms, .. } => *updated_at_ms,
            BoostFact::BoostReparented {
                reparented_at_ms, ..
            } => *reparented_at_ms,
            BoostFact::RoleGranted { granted_at_ms, .. } => *granted_at_ms,
            BoostFact::RoleRetracted {
                retracted_at_ms, ..
            } => *retracted_at_ms,
            BoostFact::HookCreated { created_at_ms, .. } => *created_at_ms,
            BoostFact::HookDeleted { deleted_at_ms, .. } => *deleted_at_ms,
            BoostFact::CredentialIssued { issued_at_ms, .. } => *issued_at_ms,
            BoostFact::CredentialClaimed { claimed_at_ms, .. } => *claimed_at_ms,
            BoostFact::CredentialRevoked { revoked_at_ms, .. } => *revoked_at_ms,
        }
    }

    /// Get the fact type name for journal keying
    pub fn fact_type(&self) -> &'static str {
        match self {
            BoostFact::BoostCreated { .. } => "boost_created",
            BoostFact::BoostUpdated { .. } => "boost_updated",
            BoostFact::BoostReparented { .. } => "boost_reparented",
            BoostFact::RoleGranted { .. } => "role_granted",
            BoostFact::RoleRetracted { .. } => "role_retracted",
            BoostFact::HookCreated { .. } => "hook_created",
            BoostFact::HookDeleted { .. } => "hook_deleted",
            BoostFact::CredentialIssued { .. } => "credential_issued",
            BoostFact::CredentialClaimed { .. } => "credential_claimed",
            BoostFact::CredentialRevoked { .. } => "credential_revoked",
        }
    }

    /// Encode this fact in a versioned JSON envelope.
    ///
    /// # Errors
    ///
    /// Returns `BoostError::Internal` if serialization fails.
    pub fn try_encode(&self) -> BoostResult<Vec<u8>> {
        let envelope = FactEnvelope {
            schema_version: BOOST_FACT_SCHEMA_VERSION,
            fact: self.clone(),
        };
        serde_json::to_vec(&envelope)
            .map_err(|e| BoostError::internal(format!("fact encoding failed: {e}")))
    }

    /// Decode a fact from a versioned JSON envelope.
    ///
    /// # Errors
    ///
    /// Returns `BoostError::BadRequest` on malformed input or a version mismatch.
    pub fn try_decode(bytes: &[u8]) -> BoostResult<Self> {
        let envelope: FactEnvelope = serde_json::from_slice(bytes)?;
        if envelope.schema_version != BOOST_FACT_SCHEMA_VERSION {
            return Err(BoostError::bad_request(format!(
                "fact schema version mismatch: expected {BOOST_FACT_SCHEMA_VERSION}, got {}",
                envelope.schema_version
            )));
        }
        Ok(envelope.fact)
    }
}

#[derive(Serialize, Deserialize)]
struct FactEnvelope {
    schema_version: u16,
    fact: BoostFact,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BoostFact {
        BoostFact::CredentialRevoked {
            issuance: IssuanceId::new(),
            boost: BoostUri::new("example.org", "n"),
            recipient: ProfileId::new("director"),
            revoker: ProfileId::new("admin"),
            revoked_at_ms: 42,
        }
    }

    #[test]
    fn fact_metadata() {
        let fact = sample();
        assert_eq!(fact.fact_type(), "credential_revoked");
        assert_eq!(fact.timestamp_ms(), 42);
        assert_eq!(fact.boost_uri().id(), "n");
    }

    #[test]
    fn fact_envelope_rejects_other_versions() {
        let fact = sample();
        let bytes = fact.try_encode().unwrap();
        assert_eq!(BoostFact::try_decode(&bytes).unwrap(), fact);

        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["schema_version"] = serde_json::json!(9);
        let tampered = serde_json::to_vec(&value).unwrap();
        assert!(BoostFact::try_decode(&tampered).is_err());
    }
}
