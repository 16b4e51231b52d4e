use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::collect::global_variables::{
    DEFAULT_NOMINATIM_URL, DEFAULT_PLATFORM_URL, DEFAULT_TIMEOUT_SECS, USER_AGENT,
};

pub const ENV_PLATFORM_URL: &str = "RSCORINE_PLATFORM_URL";
pub const ENV_PLATFORM_TOKEN: &str = "RSCORINE_PLATFORM_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "RSCORINE_TIMEOUT_SECS";
pub const ENV_NOMINATIM_URL: &str = "RSCORINE_NOMINATIM_URL";

/// Connection settings for the raster platform and the geocoder.
///
/// Missing JSON fields fall back to the defaults in `global_variables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    pub base_url: String,
    /// Bearer token, sent with every platform request when set
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub user_agent: String,
    pub nominatim_url: String,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        PlatformSettings {
            base_url: DEFAULT_PLATFORM_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: USER_AGENT.to_string(),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
        }
    }
}

impl PlatformSettings {
    /// Defaults overridden by `RSCORINE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = PlatformSettings::default();
        if let Some(url) = lookup(ENV_PLATFORM_URL) {
            settings.base_url = url;
        }
        if let Some(token) = lookup(ENV_PLATFORM_TOKEN) {
            settings.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            settings.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got {:?}", ENV_TIMEOUT_SECS, secs))?;
        }
        if let Some(url) = lookup(ENV_NOMINATIM_URL) {
            settings.nominatim_url = url;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .context(format!("Failed to read settings file: {:?}", path))?;
        let settings: PlatformSettings = serde_json::from_str(&text)
            .context(format!("Failed to parse settings file: {:?}", path))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .with_context(|| format!("Invalid platform URL: {}", self.base_url))?;
        Url::parse(&self.nominatim_url)
            .with_context(|| format!("Invalid geocoder URL: {}", self.nominatim_url))?;
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
