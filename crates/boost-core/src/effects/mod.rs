//! Collaborator effect interfaces
//!
//! The authorization core never signs credentials, resolves sessions or reads
//! the wall clock itself. Those concerns sit behind the traits in this module;
//! production handlers live in `boost-service`, mocks in `boost-testkit`.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Usage**: `BoostService` and anything that commits facts

pub mod credential;
pub mod identity;
pub mod time;

pub use credential::{CredentialEffects, CredentialPayload, SignedCredential};
pub use identity::IdentityEffects;
pub use time::PhysicalTimeEffects;

/// Bundle of every effect the service consumes
pub trait BoostEffects: CredentialEffects + IdentityEffects + PhysicalTimeEffects {}

impl<T> BoostEffects for T where T: CredentialEffects + IdentityEffects + PhysicalTimeEffects {}
