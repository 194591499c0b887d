//! Boost Testing Infrastructure
//!
//! Mock effect handlers and service fixtures shared by the integration
//! tests of the boost crates.
//!
//! ```rust,ignore
//! use boost_testkit::*;
//!
//! #[tokio::test]
//! async fn admin_creates_a_boost() {
//!     let service = test_service();
//!     register_profiles(&service, &["admin"]).await;
//!     let uri = service.create_boost(&session("admin"), named("Network")).await.unwrap();
//! }
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::{ManualClock, MockCredentials, StaticIdentity};
