//! Application settings configuration.

use serde::{Deserialize, Serialize};

use crate::query::{DEFAULT_PAGE_SIZE, PAGE_SIZES};

use super::{ConfigError, Result};

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// The list page size to start sessions with.
    pub page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Settings {
    /// Validate these settings.
    pub fn validate(&self) -> Result<()> {
        if !PAGE_SIZES.contains(&self.page_size) {
            return Err(ConfigError::ValidationError(format!(
                "page_size must be one of {:?}, got {}",
                PAGE_SIZES, self.page_size
            )));
        }
        Ok(())
    }
}
