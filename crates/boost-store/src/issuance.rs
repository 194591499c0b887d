//! Issuance log
//!
//! One record per issuance event. Several records may share a
//! (boost, recipient) pair; a credential reference appears at most once.

use boost_core::{BoostError, BoostResult, BoostUri, CredentialRef, IssuanceId, ProfileId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of an issued credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuanceStatus {
    /// Sent, not yet accepted
    Issued,
    /// Accepted by the recipient
    Claimed,
    /// Pulled by an authorized revoker
    Revoked,
}

/// Ledger entry for one issued credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRecord {
    /// Record id
    pub id: IssuanceId,
    /// Boost issued under
    pub boost_uri: BoostUri,
    /// Issuer
    pub from: ProfileId,
    /// Recipient
    pub to: ProfileId,
    /// Issued credential
    pub credential: CredentialRef,
    /// Current status
    pub status: IssuanceStatus,
    /// Issue time
    pub issued_at: u64,
    /// Claim time
    pub claimed_at: Option<u64>,
    /// Revocation time
    pub revoked_at: Option<u64>,
}

impl IssuanceRecord {
    /// Fresh record in the `Issued` state
    pub fn issued(
        boost_uri: BoostUri,
        from: ProfileId,
        to: ProfileId,
        credential: CredentialRef,
        issued_at: u64,
    ) -> Self {
        Self {
            id: IssuanceId::new(),
            boost_uri,
            from,
            to,
            credential,
            status: IssuanceStatus::Issued,
            issued_at,
            claimed_at: None,
            revoked_at: None,
        }
    }

    /// Whether the record has been revoked
    pub fn is_revoked(&self) -> bool {
        self.status == IssuanceStatus::Revoked
    }
}

/// Issuance records with lookup indexes
#[derive(Debug, Clone, Default)]
pub struct IssuanceLog {
    records: HashMap<IssuanceId, IssuanceRecord>,
    by_credential: HashMap<CredentialRef, IssuanceId>,
    by_boost: HashMap<BoostUri, Vec<IssuanceId>>,
    by_recipient: HashMap<ProfileId, Vec<IssuanceId>>,
}

impl IssuanceLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; `Conflict` if its credential is already tracked
    pub fn insert(&mut self, record: IssuanceRecord) -> BoostResult<()> {
        if self.by_credential.contains_key(&record.credential) {
            return Err(BoostError::conflict(format!(
                "Credential already issued: {}",
                record.credential
            )));
        }
        if self.records.contains_key(&record.id) {
            return Err(BoostError::conflict(format!(
                "Issuance already recorded: {}",
                record.id
            )));
        }
        self.by_credential.insert(record.credential.clone(), record.id);
        self.by_boost
            .entry(record.boost_uri.clone())
            .or_default()
            .push(record.id);
        self.by_recipient
            .entry(record.to.clone())
            .or_default()
            .push(record.id);
        self.records.insert(record.id, record);
        Ok(())
    }

    /// Look up a record
    pub fn get(&self, id: &IssuanceId) -> Option<&IssuanceRecord> {
        self.records.get(id)
    }

    /// Mutable record access; identity fields must not be changed
    pub fn get_mut(&mut self, id: &IssuanceId) -> Option<&mut IssuanceRecord> {
        self.records.get_mut(id)
    }

    /// Record tracking `credential`
    pub fn by_credential(&self, credential: &CredentialRef) -> Option<&IssuanceRecord> {
        self.by_credential
            .get(credential)
            .and_then(|id| self.records.get(id))
    }

    /// Records issued under `boost`
    pub fn for_boost<'a>(
        &'a self,
        boost: &BoostUri,
    ) -> impl Iterator<Item = &'a IssuanceRecord> + 'a {
        self.by_boost
            .get(boost)
            .into_iter()
            .flatten()
            .filter_map(|id| self.records.get(id))
    }

    /// Records sent to `recipient`
    pub fn for_recipient<'a>(
        &'a self,
        recipient: &ProfileId,
    ) -> impl Iterator<Item = &'a IssuanceRecord> + 'a {
        self.by_recipient
            .get(recipient)
            .into_iter()
            .flatten()
            .filter_map(|id| self.records.get(id))
    }

    /// Ids of records for one (boost, recipient) pair
    pub fn for_pair(&self, boost: &BoostUri, recipient: &ProfileId) -> Vec<IssuanceId> {
        self.for_boost(boost)
            .filter(|record| &record.to == recipient)
            .map(|record| record.id)
            .collect()
    }

    /// Total records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
