//! Boost Claims - permission grants driven by credential claims
//!
//! A claim hook says "whoever claims a credential issued under boost N gets
//! these permissions on boost T". [`ClaimHookEngine`] validates and stores
//! hooks and, as the ledger's [`LifecycleHooks`](boost_ledger::LifecycleHooks)
//! implementation, applies them on claim and retracts them on revoke.

#![forbid(unsafe_code)]

pub mod engine;

pub use engine::{ClaimHookEngine, NewClaimHook, DEFAULT_MAX_HOOKS_PER_BOOST};
