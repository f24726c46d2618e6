//! Configuration management.
//!
//! This module handles loading, saving, and managing user configuration:
//! tracker profiles and application settings, stored as TOML in the
//! platform config directory.

mod profile;
mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use profile::Profile;
pub use settings::Settings;

/// Environment variable that overrides the profile URL when set.
pub const URL_ENV_VAR: &str = "ISSUECTL_URL";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    /// The config directory could not be created.
    #[error("could not create configuration directory: {0}")]
    CreateDirError(std::io::Error),

    /// The config file could not be read.
    #[error("could not read configuration file: {0}")]
    ReadError(std::io::Error),

    /// The config file could not be written.
    #[error("could not write configuration file: {0}")]
    WriteError(std::io::Error),

    /// The config file is not valid TOML.
    #[error("could not parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The config could not be serialized.
    #[error("could not serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A profile or setting failed validation.
    #[error("{0}")]
    ValidationError(String),

    /// No profile with the requested name exists.
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    /// No profile is configured and no URL override is set.
    #[error("no tracker configured: add a profile to the config file or set {URL_ENV_VAR}")]
    NoProfile,
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The user configuration: settings plus tracker profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application settings.
    #[serde(default)]
    pub settings: Settings,
    /// Configured tracker profiles.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path, creating the directory.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(ConfigError::CreateDirError)?;
        }
        self.save_to(&path)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(ConfigError::WriteError)
    }

    /// The default config file path.
    pub fn config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("issuectl").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Validate settings and every profile, including name uniqueness.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        for profile in &self.profiles {
            profile.validate()?;
        }
        for (i, profile) in self.profiles.iter().enumerate() {
            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }
        Ok(())
    }

    /// Find a profile by name.
    pub fn get_profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// The profile named by settings, or the first configured one.
    pub fn default_profile(&self) -> Option<&Profile> {
        match self.settings.default_profile.as_deref() {
            Some(name) => self.profiles.iter().find(|p| p.name == name),
            None => self.profiles.first(),
        }
    }

    /// Resolve the profile a command should talk to.
    ///
    /// `ISSUECTL_URL` beats everything; an explicit `--profile` beats the
    /// configured default.
    pub fn resolve_profile(&self, explicit: Option<&str>) -> Result<Profile> {
        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            let profile = Profile::new("env".to_string(), url);
            profile.validate()?;
            return Ok(profile);
        }

        match explicit {
            Some(name) => self.get_profile(name).cloned(),
            None => self.default_profile().cloned().ok_or(ConfigError::NoProfile),
        }
    }
}
