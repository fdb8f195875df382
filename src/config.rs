use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::duration::deserialize_duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("portal.{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// Credentials and account selection for the portal login.
///
/// The password is held as a [`SecretString`] so it never leaks through
/// debug or log output.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Login identifier typed into the identifier field.
    pub account_id: String,

    /// Numeric password entered through the image keypad.
    pub account_password: SecretString,

    /// Identifier of the checking account of interest.
    pub checking_account: String,
}

impl PortalConfig {
    /// Reject credentials that would make the login flow fail late.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.account_id.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "account_id" });
        }
        if self.account_password.expose_secret().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "account_password",
            });
        }
        if self.checking_account.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "checking_account",
            });
        }
        Ok(())
    }
}

fn nonzero(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).expect("attempt budgets are nonzero")
}

/// Settle delays and polling budgets for the login flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after identifier and password submission while the page settles.
    #[serde(deserialize_with = "deserialize_duration")]
    pub settle: Duration,

    /// Attempt budget for the MFA fallback dialog to disappear. Generous,
    /// since a human has to approve out of band.
    pub mfa_attempts: NonZeroU32,

    #[serde(deserialize_with = "deserialize_duration")]
    pub mfa_delay: Duration,

    /// Attempt budget for account tiles to appear after login.
    pub tiles_attempts: NonZeroU32,

    #[serde(deserialize_with = "deserialize_duration")]
    pub tiles_delay: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
            mfa_attempts: nonzero(30),
            mfa_delay: Duration::from_secs(2),
            tiles_attempts: nonzero(5),
            tiles_delay: Duration::from_secs(1),
        }
    }
}

/// Digit recognition settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Directory holding the engine's trained data; engine default when
    /// unset.
    pub tessdata_path: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub recognition: RecognitionConfig,
}

impl Config {
    /// Load and validate config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.portal.validate()?;

        Ok(config)
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./guichet.toml` if it exists in the current directory
/// 2. `~/.local/share/guichet/guichet.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("guichet.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("guichet").join("guichet.toml");
    }

    local_config
}
