//! Unsigned credential handler
//!
//! Wraps payloads with a proof that binds the credential id and boost but
//! carries no cryptography. Suitable for single-process deployments where
//! the ledger itself is the source of truth; wallets plug real signing in
//! behind [`CredentialEffects`].

use async_trait::async_trait;
use boost_core::{BoostResult, CredentialEffects, CredentialPayload, SignedCredential};

const PROOF_PREFIX: &str = "unsigned";

/// Credential handler producing unsigned proofs
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsignedCredentials;

impl UnsignedCredentials {
    fn proof_for(payload: &CredentialPayload) -> String {
        format!("{PROOF_PREFIX}:{}:{}", payload.id, payload.boost_uri)
    }
}

#[async_trait]
impl CredentialEffects for UnsignedCredentials {
    async fn sign(&self, payload: CredentialPayload) -> BoostResult<SignedCredential> {
        let proof = Self::proof_for(&payload);
        Ok(SignedCredential { payload, proof })
    }

    async fn verify(&self, credential: &SignedCredential) -> BoostResult<bool> {
        Ok(credential.proof == Self::proof_for(&credential.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boost_core::{BoostUri, CredentialRef, ProfileId};

    fn payload() -> CredentialPayload {
        CredentialPayload {
            id: CredentialRef::new("example.org", "c1"),
            boost_uri: BoostUri::new("example.org", "b1"),
            issuer: ProfileId::new("admin"),
            subject: ProfileId::new("scout"),
            body: serde_json::Value::Null,
        }
    }

    #[test]
    fn signed_credentials_verify_until_tampered() {
        let handler = UnsignedCredentials;
        let mut signed = futures::executor::block_on(handler.sign(payload())).unwrap();
        assert!(futures::executor::block_on(handler.verify(&signed)).unwrap());

        signed.payload.boost_uri = BoostUri::new("example.org", "other");
        assert!(!futures::executor::block_on(handler.verify(&signed)).unwrap());
    }
}
