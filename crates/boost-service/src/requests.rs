//! Request and response shapes of the RPC surface

use boost_core::{PageRequest, PermissionSet, SignedCredential};
use boost_ledger::RecipientFilter;
use boost_store::{BoostPayload, IssuanceRecord};
use serde::{Deserialize, Serialize};

/// `createBoost` / `createChildBoost` body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBoost {
    /// Credential template
    #[serde(flatten)]
    pub payload: BoostPayload,
    /// Policy for any authenticated actor; never inherited by children
    pub default_permissions: Option<PermissionSet>,
    /// Role granted on this boost to whoever claims its credential
    pub claim_permissions: Option<PermissionSet>,
}

/// `updateBoost` body; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoostUpdates {
    /// New display name
    pub name: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New credential template body
    pub credential: Option<serde_json::Value>,
    /// New default policy
    pub default_permissions: Option<PermissionSet>,
    /// New claim role
    pub claim_permissions: Option<PermissionSet>,
}

impl BoostUpdates {
    /// Whether nothing would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.credential.is_none()
            && self.default_permissions.is_none()
            && self.claim_permissions.is_none()
    }
}

/// `getBoostRecipients` options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipientQuery {
    /// Page window
    #[serde(flatten)]
    pub page: PageRequest,
    /// Status filter
    #[serde(flatten)]
    pub filter: RecipientFilter,
}

/// Result of `issueBoost`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issued {
    /// Ledger record
    pub record: IssuanceRecord,
    /// Credential as signed
    pub credential: SignedCredential,
}
