//! Boost Ledger - issuance records and their lifecycle
//!
//! Records who issued which credential, to whom and under which boost, and
//! drives the `Issued -> Claimed -> Revoked` transitions. Claim and revoke
//! transitions notify [`LifecycleHooks`] inside the same store transaction.

#![forbid(unsafe_code)]

pub mod queries;
pub mod transitions;

pub use queries::{
    analytics, recipient_count, recipients, revoked_for, BoostAnalytics, RecipientCursor,
    RecipientFilter,
};
pub use transitions::{Issuance, IssuanceLedger, LifecycleHooks, NoHooks};
