//! Boost Core - shared vocabulary for the boost authorization system
//!
//! This crate holds the types every other boost crate speaks: identifiers,
//! the unified error, permission sets and delegation scopes, journal facts,
//! collaborator effect traits and the configuration trait. It contains no
//! storage and no decision logic.
//!
//! # Algebra
//!
//! - `PermissionSet` and `ChildScope` are join-semilattices: merging grants
//!   only widens them, and `PermissionSet::empty()` is bottom.
//! - Delegation scopes are exhaustive: `None`, `All`, or an explicit list.

#![forbid(unsafe_code)]

// === Core Modules ===

/// Configuration loading and validation
pub mod config;

/// Collaborator effect interfaces
pub mod effects;

/// Unified error handling
pub mod errors;

/// Journal facts
pub mod facts;

/// Boost, credential, profile and hook identifiers
pub mod identifiers;

/// Cursor pagination
pub mod pagination;

/// Permission sets, delegation scopes and capabilities
pub mod permissions;

/// Join-semilattice traits
pub mod semilattice;

// === Public API Re-exports ===

pub use config::BoostConfig;
pub use effects::{
    BoostEffects, CredentialEffects, CredentialPayload, IdentityEffects, PhysicalTimeEffects,
    SignedCredential,
};
pub use errors::{BoostError, BoostResult, ErrorCode};
pub use facts::BoostFact;
pub use identifiers::{BoostUri, CredentialRef, HookId, IssuanceId, ProfileId, SessionToken};
pub use pagination::{Page, PageRequest};
pub use permissions::{
    Capability, ChildScope, FlagUpdate, GrantedFlag, PermissionSet, PermissionUpdate,
};
pub use semilattice::{Bottom, JoinSemilattice};
