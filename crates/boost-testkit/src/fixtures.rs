//! Service fixtures
//!
//! A [`TestService`] runs over an in-memory store with the mock handlers.
//! Sessions are plain tokens named after their profile.

use crate::mocks::{ManualClock, MockCredentials, StaticIdentity};
use boost_core::{
    BoostUri, CredentialPayload, CredentialRef, ProfileId, SessionToken, SignedCredential,
};
use boost_service::{BoostService, BoostServiceConfig, CreateBoost, Effects};
use boost_store::{BoostPayload, MemoryStore};

/// Domain used by fixtures
pub const TEST_DOMAIN: &str = "test.example.org";

/// Mock handler bundle
pub type TestEffects = Effects<MockCredentials, StaticIdentity, ManualClock>;

/// Service over the mocks
pub type TestService = BoostService<MemoryStore, TestEffects>;

/// Configuration used by [`test_service`]
pub fn test_config() -> BoostServiceConfig {
    BoostServiceConfig {
        domain: TEST_DOMAIN.to_string(),
        ..BoostServiceConfig::default()
    }
}

/// Fresh service with no profiles
pub fn test_service() -> TestService {
    test_service_with(test_config())
}

/// Fresh service with a custom configuration
///
/// # Panics
///
/// If `config` is invalid.
pub fn test_service_with(config: BoostServiceConfig) -> TestService {
    let effects = Effects::new(
        MockCredentials::new(),
        StaticIdentity::new(),
        ManualClock::default(),
    );
    BoostService::new(config, MemoryStore::new(), effects).expect("valid test configuration")
}

/// Session acting as `name`
pub fn session(name: &str) -> SessionToken {
    SessionToken::new(name)
}

/// Profile id `name`
pub fn profile(name: &str) -> ProfileId {
    ProfileId::new(name)
}

/// Register one profile per name
///
/// # Panics
///
/// If a name is malformed or taken.
pub async fn register_profiles(service: &TestService, names: &[&str]) {
    for name in names {
        service
            .create_profile(&session(name), name, None)
            .await
            .expect("profile registers");
    }
}

/// Boost request with a display name and nothing else
pub fn named(name: &str) -> CreateBoost {
    CreateBoost {
        payload: BoostPayload {
            name: Some(name.to_string()),
            ..BoostPayload::default()
        },
        ..CreateBoost::default()
    }
}

/// Credential for `uri` that the mock verifier accepts
pub fn credential_for(
    uri: &BoostUri,
    issuer: &str,
    recipient: &str,
    id: &str,
) -> SignedCredential {
    MockCredentials::envelope(CredentialPayload {
        id: CredentialRef::new(TEST_DOMAIN, id),
        boost_uri: uri.clone(),
        issuer: profile(issuer),
        subject: profile(recipient),
        body: serde_json::Value::Null,
    })
}
