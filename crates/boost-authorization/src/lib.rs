//! Boost Authorization - permission decisions over the boost graph
//!
//! [`PermissionResolver`] answers "may this actor exercise this capability
//! on this boost?" from direct roles, default policies and ancestor
//! delegation. It also computes the effective permission set reported back
//! to callers and enforces the escalation guard on permission management.

#![forbid(unsafe_code)]

pub mod guard;
pub mod resolver;

pub use resolver::{Decision, Grounds, PermissionResolver, POLICY_CAPABILITIES};
