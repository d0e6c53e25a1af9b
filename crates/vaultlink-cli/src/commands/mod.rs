//! Subcommand implementations

pub mod connect;
pub mod handle;
pub mod links;
pub mod whoami;

use anyhow::{Context, Result};
use url::Url;
use vaultlink_core::ConsentConfig;

/// Origin from `--origin`, falling back to the config file
pub fn resolve_origin(config: &ConsentConfig, origin: Option<&str>) -> Result<Url> {
    match origin {
        Some(origin) => {
            Url::parse(origin).with_context(|| format!("Invalid --origin '{}'", origin))
        }
        None => Ok(config.origin_url()?),
    }
}
