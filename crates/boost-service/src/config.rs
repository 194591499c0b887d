//! Service configuration
//!
//! ```toml
//! domain = "network.example.org"
//! default_page_size = 25
//! max_page_size = 100
//! max_hooks_per_boost = 32
//! ```

use boost_claims::DEFAULT_MAX_HOOKS_PER_BOOST;
use boost_core::config::env_override;
use boost_core::{BoostConfig, BoostError, BoostResult};
use serde::{Deserialize, Serialize};

/// Configuration for [`crate::BoostService`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostServiceConfig {
    /// Domain minted into boost and credential URIs
    pub domain: String,
    /// Page size when a request gives no limit
    pub default_page_size: usize,
    /// Largest page a request may ask for
    pub max_page_size: usize,
    /// Hooks allowed per claim boost
    pub max_hooks_per_boost: usize,
}

impl Default for BoostServiceConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            default_page_size: 25,
            max_page_size: 100,
            max_hooks_per_boost: DEFAULT_MAX_HOOKS_PER_BOOST,
        }
    }
}

impl BoostConfig for BoostServiceConfig {
    fn merge_with_env(&mut self) -> BoostResult<()> {
        if let Some(domain) = env_override("DOMAIN")? {
            self.domain = domain;
        }
        if let Some(size) = env_override("DEFAULT_PAGE_SIZE")? {
            self.default_page_size = size;
        }
        if let Some(size) = env_override("MAX_PAGE_SIZE")? {
            self.max_page_size = size;
        }
        if let Some(max) = env_override("MAX_HOOKS_PER_BOOST")? {
            self.max_hooks_per_boost = max;
        }
        Ok(())
    }

    fn validate(&self) -> BoostResult<()> {
        if self.domain.is_empty() || self.domain.contains(':') {
            return Err(BoostError::bad_request(format!(
                "domain must be non-empty and contain no ':': {:?}",
                self.domain
            )));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(BoostError::bad_request(format!(
                "default_page_size must be in 1..={}, got {}",
                self.max_page_size, self.default_page_size
            )));
        }
        if self.max_hooks_per_boost == 0 {
            return Err(BoostError::bad_request(
                "max_hooks_per_boost must be positive",
            ));
        }
        Ok(())
    }
}

impl BoostServiceConfig {
    /// Clamp a requested page size to the configured bounds
    pub fn page_limit(&self, requested: Option<usize>) -> BoostResult<usize> {
        match requested {
            None => Ok(self.default_page_size),
            Some(0) => Err(BoostError::bad_request("Page limit must be positive")),
            Some(limit) => Ok(limit.min(self.max_page_size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        BoostServiceConfig::defaults().validate().unwrap();
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "domain = \"network.example.org\"\nmax_page_size = 50").unwrap();
        let config = BoostServiceConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.domain, "network.example.org");
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.default_page_size, 25);
    }

    #[test]
    fn rejects_bad_values() {
        let colon = BoostServiceConfig {
            domain: "a:b".to_string(),
            ..BoostServiceConfig::default()
        };
        assert!(colon.validate().is_err());

        let pages = BoostServiceConfig {
            default_page_size: 200,
            ..BoostServiceConfig::default()
        };
        assert!(pages.validate().is_err());

        let hooks = BoostServiceConfig {
            max_hooks_per_boost: 0,
            ..BoostServiceConfig::default()
        };
        assert!(hooks.validate().is_err());
    }

    #[test]
    fn page_limit_clamps() {
        let config = BoostServiceConfig::default();
        assert_eq!(config.page_limit(None).unwrap(), 25);
        assert_eq!(config.page_limit(Some(1_000)).unwrap(), 100);
        assert!(config.page_limit(Some(0)).is_err());
    }
}
