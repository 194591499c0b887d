//! Core configuration traits
//!
//! Configuration is read from TOML, then overridden by `BOOST_*` environment
//! variables, then validated. Invalid configuration is a `BadRequest`.

use crate::{BoostError, BoostResult};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::str::FromStr;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "BOOST_";

/// Core trait for boost configuration types
pub trait BoostConfig: Clone + Default + DeserializeOwned + Send + Sync + 'static {
    /// Get default configuration values
    fn defaults() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    fn load_from_file(path: &Path) -> BoostResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BoostError::internal(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    fn from_toml_str(content: &str) -> BoostResult<Self> {
        toml::from_str(content).map_err(|e| BoostError::bad_request(format!("Invalid TOML: {e}")))
    }

    /// Merge with `BOOST_*` environment variables
    fn merge_with_env(&mut self) -> BoostResult<()>;

    /// Validate the configuration
    fn validate(&self) -> BoostResult<()>;

    /// Load, merge with the environment and validate in one step
    fn load(path: Option<&Path>) -> BoostResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::defaults(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }
}

/// Read `BOOST_<key>` from the environment and parse it.
///
/// Returns `Ok(None)` when the variable is unset.
pub fn env_override<T>(key: &str) -> BoostResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let name = format!("{ENV_PREFIX}{key}");
    match std::env::var(&name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| BoostError::bad_request(format!("Invalid value for {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    #[serde(default)]
    struct SampleConfig {
        name: String,
        limit: u32,
    }

    impl Default for SampleConfig {
        fn default() -> Self {
            Self {
                name: "sample".to_string(),
                limit: 10,
            }
        }
    }

    impl BoostConfig for SampleConfig {
        fn merge_with_env(&mut self) -> BoostResult<()> {
            if let Some(limit) = env_override("CORE_TEST_SAMPLE_LIMIT")? {
                self.limit = limit;
            }
            Ok(())
        }

        fn validate(&self) -> BoostResult<()> {
            if self.limit == 0 {
                return Err(BoostError::bad_request("limit must be positive"));
            }
            Ok(())
        }
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "limit = 3").unwrap();

        let config = SampleConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.limit, 3);
        assert_eq!(config.name, "sample");
    }

    #[test]
    fn invalid_toml_is_bad_request() {
        let err = SampleConfig::from_toml_str("limit = \"many\"").unwrap_err();
        assert!(matches!(err, BoostError::BadRequest { .. }));
    }

    #[test]
    fn validation_runs_on_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "limit = 0").unwrap();
        assert!(SampleConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn missing_env_override_is_none() {
        let value: Option<u32> = env_override("CORE_TEST_DEFINITELY_UNSET").unwrap();
        assert!(value.is_none());
    }
}
