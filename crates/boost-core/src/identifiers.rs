//! Core identifier types
//!
//! Boost and credential references are URIs minted under a network domain:
//! `lc:network:<domain>:boost:<id>` and `lc:network:<domain>:credential:<id>`.
//! Actors are identified by their profile handle.

use crate::{BoostError, BoostResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const URI_PREFIX: &str = "lc:network:";

fn parse_network_uri<'a>(raw: &'a str, kind: &str) -> BoostResult<(&'a str, &'a str)> {
    let rest = raw
        .strip_prefix(URI_PREFIX)
        .ok_or_else(|| BoostError::bad_request(format!("Invalid {kind} URI: {raw}")))?;
    let marker = format!(":{kind}:");
    let (domain, id) = rest
        .rsplit_once(marker.as_str())
        .ok_or_else(|| BoostError::bad_request(format!("Invalid {kind} URI: {raw}")))?;
    if domain.is_empty() || domain.contains(':') || id.is_empty() || id.contains(':') {
        return Err(BoostError::bad_request(format!("Invalid {kind} URI: {raw}")));
    }
    Ok((domain, id))
}

/// Profile handle identifying an actor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Create a profile id without validation
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a handle, enforcing 3–40 chars of `[a-z0-9-_]`
    pub fn parse(raw: &str) -> BoostResult<Self> {
        let valid_len = (3..=40).contains(&raw.len());
        let valid_chars = raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid_len || !valid_chars {
            return Err(BoostError::bad_request(format!(
                "Invalid profile id: {raw}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the handle
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// URI of a boost node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoostUri(String);

impl BoostUri {
    /// Mint a URI for `id` under `domain`
    pub fn new(domain: &str, id: impl fmt::Display) -> Self {
        Self(format!("{URI_PREFIX}{domain}:boost:{id}"))
    }

    /// Mint a fresh random URI under `domain`
    pub fn generate(domain: &str) -> Self {
        Self::new(domain, Uuid::new_v4())
    }

    /// Domain segment of the URI
    pub fn domain(&self) -> &str {
        parse_network_uri(&self.0, "boost")
            .map(|(domain, _)| domain)
            .unwrap_or_default()
    }

    /// Id segment of the URI
    pub fn id(&self) -> &str {
        parse_network_uri(&self.0, "boost")
            .map(|(_, id)| id)
            .unwrap_or_default()
    }

    /// Borrow the raw URI
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BoostUri {
    type Err = BoostError;

    fn from_str(raw: &str) -> BoostResult<Self> {
        parse_network_uri(raw, "boost")?;
        Ok(Self(raw.to_string()))
    }
}

impl TryFrom<String> for BoostUri {
    type Error = BoostError;

    fn try_from(raw: String) -> BoostResult<Self> {
        raw.parse()
    }
}

impl From<BoostUri> for String {
    fn from(uri: BoostUri) -> Self {
        uri.0
    }
}

impl fmt::Display for BoostUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to an issued credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialRef(String);

impl CredentialRef {
    /// Mint a reference for `id` under `domain`
    pub fn new(domain: &str, id: impl fmt::Display) -> Self {
        Self(format!("{URI_PREFIX}{domain}:credential:{id}"))
    }

    /// Mint a fresh random reference under `domain`
    pub fn generate(domain: &str) -> Self {
        Self::new(domain, Uuid::new_v4())
    }

    /// Borrow the raw reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CredentialRef {
    type Err = BoostError;

    fn from_str(raw: &str) -> BoostResult<Self> {
        parse_network_uri(raw, "credential")?;
        Ok(Self(raw.to_string()))
    }
}

impl TryFrom<String> for CredentialRef {
    type Error = BoostError;

    fn try_from(raw: String) -> BoostResult<Self> {
        raw.parse()
    }
}

impl From<CredentialRef> for String {
    fn from(reference: CredentialRef) -> Self {
        reference.0
    }
}

impl fmt::Display for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claim hook identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HookId(pub Uuid);

impl HookId {
    /// Create a new random hook id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for HookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook-{}", self.0)
    }
}

/// Issuance record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssuanceId(pub Uuid);

impl IssuanceId {
    /// Create a new random issuance id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for IssuanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IssuanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IssuanceId {
    type Err = BoostError;

    fn from_str(raw: &str) -> BoostResult<Self> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|e| BoostError::bad_request(format!("Invalid issuance id {raw}: {e}")))
    }
}

/// Opaque bearer token presented by a caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
