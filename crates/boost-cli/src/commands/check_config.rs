//! `boost check-config`: load, merge and validate a service configuration

use anyhow::{Context, Result};
use boost_core::BoostConfig;
use boost_service::BoostServiceConfig;
use std::path::Path;
use tracing::info;

/// Validate the configuration and print the effective values as TOML
pub fn run(path: Option<&Path>) -> Result<()> {
    let config = BoostServiceConfig::load(path).context("configuration is invalid")?;
    print!("{}", toml::to_string_pretty(&config)?);
    info!(domain = %config.domain, "configuration ok");
    Ok(())
}
