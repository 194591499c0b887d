//! Credential signing and verification
//!
//! Proof formats are opaque here. A handler receives the unsigned payload and
//! returns it wrapped with whatever proof its wallet produces; verification is
//! a yes/no answer over the same envelope.

use crate::identifiers::{BoostUri, CredentialRef, ProfileId};
use crate::BoostResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Unsigned credential issued under a boost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPayload {
    /// Reference the ledger will track the credential by
    pub id: CredentialRef,
    /// Boost the credential is issued under
    pub boost_uri: BoostUri,
    /// Issuing profile
    pub issuer: ProfileId,
    /// Recipient profile
    pub subject: ProfileId,
    /// Credential body copied from the boost template
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Credential with an attached proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCredential {
    /// Signed content
    pub payload: CredentialPayload,
    /// Opaque proof produced by the signer
    pub proof: String,
}

impl SignedCredential {
    /// Reference the credential is tracked by
    pub fn id(&self) -> &CredentialRef {
        &self.payload.id
    }

    /// Boost the credential claims to be issued under
    pub fn boost_uri(&self) -> &BoostUri {
        &self.payload.boost_uri
    }
}

/// Credential cryptography collaborator
#[async_trait]
pub trait CredentialEffects: Send + Sync {
    /// Sign a payload
    async fn sign(&self, payload: CredentialPayload) -> BoostResult<SignedCredential>;

    /// Check a credential's proof
    async fn verify(&self, credential: &SignedCredential) -> BoostResult<bool>;
}
