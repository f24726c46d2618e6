//! Tracker server profiles.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// A named tracker instance.
///
/// Profiles store the base URL of a tracker deployment so the CLI can be
/// pointed at staging and production without retyping URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// The name of this profile.
    ///
    /// Must be non-empty and unique across all profiles.
    pub name: String,

    /// The tracker instance URL (e.g. "http://localhost:8000").
    pub url: String,
}

impl Profile {
    /// Create a new profile.
    pub fn new(name: String, url: String) -> Self {
        Self { name, url }
    }

    /// Validate this profile.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if the name is
    /// empty or contains whitespace, or the URL is empty or lacks an
    /// http/https scheme.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "profile name cannot be empty".to_string(),
            ));
        }

        if self.name.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            )));
        }

        if self.url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': URL cannot be empty",
                self.name
            )));
        }

        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': URL must start with http:// or https://",
                self.name
            )));
        }

        Ok(())
    }
}
