//! Boost Service - the RPC surface of the boost authorization system
//!
//! [`BoostService`] exposes one async method per RPC operation. It resolves
//! callers through [`IdentityEffects`](boost_core::IdentityEffects), awaits
//! signing, verification and the clock up front, and then performs each
//! permission check together with its write inside one
//! [`BoostStore`](boost_store::BoostStore) transaction.
//!
//! # Usage
//!
//! ```rust,ignore
//! let identity = LocalIdentity::new();
//! let token = identity.login(ProfileId::new("admin"));
//! let effects = Effects::new(UnsignedCredentials, identity, SystemClock);
//! let service = BoostService::new(BoostServiceConfig::default(), MemoryStore::new(), effects)?;
//! service.create_profile(&token, "admin", None).await?;
//! let network = service.create_boost(&token, CreateBoost::default()).await?;
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod handlers;
pub mod requests;
pub mod service;

pub use config::BoostServiceConfig;
pub use handlers::{Effects, LocalEffects, LocalIdentity, SystemClock, UnsignedCredentials};
pub use requests::{BoostUpdates, CreateBoost, Issued, RecipientQuery};
pub use service::BoostService;
