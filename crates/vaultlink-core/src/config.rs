//! Configuration loading
//!
//! Read from `--config <path>` or `<config dir>/vaultlink/config.toml`. A
//! missing file means defaults; a malformed one is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::consent::mode::FlowMode;
use crate::consent::popup::PopupOptions;
use crate::consent::request::AuthRouting;
use crate::error::{ConsentError, Result};
use crate::platform::WindowFeatures;

pub const CONFIG_FILE_NAME: &str = "config.toml";

const APP_DIR: &str = "vaultlink";
const DEFAULT_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// Origin of the web app hosting the connect endpoint
    pub origin: String,
    /// Path of the page the redirect flow returns to by default
    pub page_path: String,
    pub connect_path: Option<String>,
    pub return_to: Option<String>,
    pub mode: FlowMode,
    pub poll_interval_ms: u64,
    /// Unset means the popup is watched until it closes
    pub popup_max_wait_secs: Option<u64>,
    pub popup_width: u32,
    pub popup_height: u32,
    /// User agent used to classify the device in `auto` mode
    pub user_agent: Option<String>,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            page_path: "/".to_string(),
            connect_path: None,
            return_to: None,
            mode: FlowMode::Auto,
            poll_interval_ms: 1000,
            popup_max_wait_secs: None,
            popup_width: WindowFeatures::POPUP.width,
            popup_height: WindowFeatures::POPUP.height,
            user_agent: None,
        }
    }
}

impl ConsentConfig {
    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from [`Self::default_path`] when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::parse(&content)?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn origin_url(&self) -> Result<Url> {
        Url::parse(&self.origin).map_err(|source| ConsentError::InvalidOrigin {
            origin: self.origin.clone(),
            source,
        })
    }

    pub fn routing(&self) -> AuthRouting {
        AuthRouting {
            connect_path: self.connect_path.clone(),
            return_to: self.return_to.clone(),
        }
    }

    pub fn popup_options(&self) -> PopupOptions {
        PopupOptions {
            features: WindowFeatures::POPUP.with_size(self.popup_width, self.popup_height),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            max_wait: self.popup_max_wait_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsentConfig::default();
        assert_eq!(config.mode, FlowMode::Auto);
        assert_eq!(config.routing(), AuthRouting::default());

        let options = config.popup_options();
        assert_eq!(options, PopupOptions::default());
    }

    #[test]
    fn test_partial_file() {
        let config = ConsentConfig::parse(
            r#"
            origin = "https://assistant.example.com"
            mode = "redirect"
            return_to = "/chat"
            popup_max_wait_secs = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, FlowMode::Redirect);
        assert_eq!(config.return_to.as_deref(), Some("/chat"));
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(
            config.popup_options().max_wait,
            Some(Duration::from_secs(300))
        );
        assert_eq!(
            config.origin_url().unwrap().as_str(),
            "https://assistant.example.com/"
        );
    }

    #[test]
    fn test_invalid_mode_is_error() {
        let err = ConsentConfig::parse(r#"mode = "sideways""#).unwrap_err();
        assert!(matches!(err, ConsentError::Config(_)));
    }

    #[test]
    fn test_invalid_origin() {
        let config = ConsentConfig {
            origin: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.origin_url(),
            Err(ConsentError::InvalidOrigin { .. })
        ));
    }

    #[test]
    fn test_load_missing_and_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config = ConsentConfig::load(Some(&path)).unwrap();
        assert_eq!(config, ConsentConfig::default());

        std::fs::write(&path, "poll_interval_ms = 250\npopup_width = 600\n").unwrap();
        let config = ConsentConfig::load(Some(&path)).unwrap();
        let options = config.popup_options();
        assert_eq!(options.poll_interval, Duration::from_millis(250));
        assert_eq!(options.features.width, 600);
        assert_eq!(options.features.height, 650);
    }
}
