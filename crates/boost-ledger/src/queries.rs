//! Read-only ledger queries

use boost_core::{BoostError, BoostResult, BoostUri, IssuanceId, Page, ProfileId};
use boost_store::{IssuanceRecord, IssuanceStatus, StoreState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Position after the last record of a recipients page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecipientCursor {
    /// Issue time of the last record seen
    pub issued_at: u64,
    /// Id of the last record seen
    pub id: IssuanceId,
}

impl RecipientCursor {
    /// Cursor positioned at `record`
    pub fn at(record: &IssuanceRecord) -> Self {
        Self {
            issued_at: record.issued_at,
            id: record.id,
        }
    }
}

impl fmt::Display for RecipientCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.issued_at, self.id)
    }
}

impl FromStr for RecipientCursor {
    type Err = BoostError;

    fn from_str(raw: &str) -> BoostResult<Self> {
        let invalid = || BoostError::bad_request(format!("Invalid cursor: {raw}"));
        let (issued_at, id) = raw.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            issued_at: issued_at.parse().map_err(|_| invalid())?,
            id: id.parse().map_err(|_| invalid())?,
        })
    }
}

/// Which records a recipients listing includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipientFilter {
    /// Include records not yet claimed
    pub include_unaccepted: bool,
    /// Include revoked records
    pub include_revoked: bool,
}

impl Default for RecipientFilter {
    fn default() -> Self {
        Self {
            include_unaccepted: true,
            include_revoked: false,
        }
    }
}

impl RecipientFilter {
    fn admits(&self, record: &IssuanceRecord) -> bool {
        match record.status {
            IssuanceStatus::Issued => self.include_unaccepted,
            IssuanceStatus::Claimed => true,
            IssuanceStatus::Revoked => self.include_revoked,
        }
    }
}

/// Issuance totals for one boost
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostAnalytics {
    /// Every record ever issued
    pub total_issued: usize,
    /// Records awaiting acceptance
    pub pending: usize,
    /// Records currently claimed
    pub claimed: usize,
    /// Records revoked
    pub revoked: usize,
    /// Distinct recipients holding a non-revoked record
    pub distinct_recipients: usize,
}

/// Page of records issued under `boosts`, newest first.
///
/// Ordering is by `(issued_at, id)` descending; `cursor` resumes strictly
/// after the given position.
pub fn recipients(
    state: &StoreState,
    boosts: &[BoostUri],
    filter: RecipientFilter,
    limit: usize,
    cursor: Option<RecipientCursor>,
) -> Page<IssuanceRecord> {
    let mut records: Vec<&IssuanceRecord> = boosts
        .iter()
        .flat_map(|boost| state.issuances.for_boost(boost))
        .filter(|record| filter.admits(record))
        .filter(|record| cursor.map_or(true, |after| RecipientCursor::at(record) < after))
        .collect();
    records.sort_by(|a, b| RecipientCursor::at(b).cmp(&RecipientCursor::at(a)));

    Page::from_ordered(records.into_iter().cloned(), limit, |record| {
        RecipientCursor::at(record).to_string()
    })
}

/// Distinct recipients with a non-revoked record under `boosts`
pub fn recipient_count(state: &StoreState, boosts: &[BoostUri]) -> usize {
    boosts
        .iter()
        .flat_map(|boost| state.issuances.for_boost(boost))
        .filter(|record| !record.is_revoked())
        .map(|record| &record.to)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Revoked records held by `recipient` across all boosts, newest first
pub fn revoked_for(state: &StoreState, recipient: &ProfileId) -> Vec<IssuanceRecord> {
    let mut revoked: Vec<IssuanceRecord> = state
        .issuances
        .for_recipient(recipient)
        .filter(|record| record.is_revoked())
        .cloned()
        .collect();
    revoked.sort_by(|a, b| b.revoked_at.cmp(&a.revoked_at));
    revoked
}

/// Totals for `boost`
pub fn analytics(state: &StoreState, boost: &BoostUri) -> BoostAnalytics {
    let mut totals = BoostAnalytics::default();
    for record in state.issuances.for_boost(boost) {
        totals.total_issued += 1;
        match record.status {
            IssuanceStatus::Issued => totals.pending += 1,
            IssuanceStatus::Claimed => totals.claimed += 1,
            IssuanceStatus::Revoked => totals.revoked += 1,
        }
    }
    totals.distinct_recipients = recipient_count(state, std::slice::from_ref(boost));
    totals
}
