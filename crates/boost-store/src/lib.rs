//! Boost Store - transactional state for the boost authorization system
//!
//! Holds the resource graph, the grant store with per-grant provenance, the
//! claim hook registry, the issuance log, profiles and the fact journal.
//! All of it is reached through [`BoostStore`], whose transactions are
//! all-or-nothing.

#![forbid(unsafe_code)]

pub mod graph;
pub mod grants;
pub mod hooks;
pub mod issuance;
pub mod memory;
pub mod profiles;
pub mod state;

pub use graph::{Ancestors, Boost, BoostGraph, BoostPayload};
pub use grants::{GrantSource, GrantStore, RoleChange, RoleEdge};
pub use hooks::{ClaimHook, HookKind, HookRegistry};
pub use issuance::{IssuanceLog, IssuanceRecord, IssuanceStatus};
pub use memory::{BoostStore, MemoryStore};
pub use profiles::{Profile, ProfileRegistry};
pub use state::StoreState;
