//! Google API configuration.

use std::env;

use serde::{Deserialize, Serialize};

use crate::{error::Result, set_error};

/// Google Gemini API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoogleConfig {
    /// Environment variable that contains the API key.
    pub api_key_env: String,

    /// The base URL to use for API requests.
    pub base_url: String,

    /// API version path segment.
    pub api_version: String,

    /// The model to send conversations to.
    pub model: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".to_owned(),
            base_url: "https://generativelanguage.googleapis.com".to_owned(),
            api_version: "v1beta".to_owned(),
            model: "gemini-1.5-flash".to_owned(),
        }
    }
}

impl GoogleConfig {
    /// Set a configuration value using a stringified key/value pair.
    pub fn set(&mut self, path: &str, key: &str, value: impl Into<String>) -> Result<()> {
        match key {
            "api_key_env" => self.api_key_env = value.into(),
            "base_url" => self.base_url = value.into(),
            "api_version" => self.api_version = value.into(),
            "model" => self.model = value.into(),
            _ => return set_error(path),
        }

        Ok(())
    }

    /// Read the API key from the configured environment variable.
    ///
    /// An unset or blank variable yields `None`.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
