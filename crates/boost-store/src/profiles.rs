//! Profile registry

use boost_core::{BoostError, BoostResult, ProfileId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registered actor profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Unique handle
    pub profile_id: ProfileId,
    /// Optional display name
    pub display_name: Option<String>,
    /// Registration time
    pub created_at: u64,
}

/// Profiles by handle
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<ProfileId, Profile>,
}

impl ProfileRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile; `Conflict` on a taken handle
    pub fn insert(&mut self, profile: Profile) -> BoostResult<()> {
        if self.profiles.contains_key(&profile.profile_id) {
            return Err(BoostError::conflict(format!(
                "Profile id already taken: {}",
                profile.profile_id
            )));
        }
        self.profiles.insert(profile.profile_id.clone(), profile);
        Ok(())
    }

    /// Look up a profile
    pub fn get(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.get(id)
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &ProfileId) -> bool {
        self.profiles.contains_key(id)
    }

    /// Look up a profile or fail with `NotFound`
    pub fn require(&self, id: &ProfileId) -> BoostResult<&Profile> {
        self.get(id)
            .ok_or_else(|| BoostError::not_found(format!("Profile not found: {id}")))
    }
}
