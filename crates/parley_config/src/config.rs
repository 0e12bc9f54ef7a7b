use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    error::Result, google::GoogleConfig, server::ServerConfig, session::SessionConfig,
    set_error, upload::UploadConfig,
};

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "PARLEY_";

/// All configuration keys accepted by [`Config::set`].
pub const KEYS: &[&str] = &[
    "server.address",
    "server.port",
    "google.api_key_env",
    "google.base_url",
    "google.api_version",
    "google.model",
    "upload.max_bytes",
    "upload.staging_dir",
    "upload.default_mime_type",
    "upload.default_instruction",
    "session.cookie_name",
    "session.header_name",
];

/// Parley configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Google Gemini API configuration.
    pub google: GoogleConfig,

    /// File upload configuration.
    pub upload: UploadConfig,

    /// Session tracking configuration.
    pub session: SessionConfig,
}

impl Config {
    /// Set a configuration value using a stringified key/value pair.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let path = key;
        match key.split_once('.') {
            Some(("server", key)) => self.server.set(path, key, value)?,
            Some(("google", key)) => self.google.set(path, key, value)?,
            Some(("upload", key)) => self.upload.set(path, key, value)?,
            Some(("session", key)) => self.session.set(path, key, value)?,
            _ => return set_error(path),
        }

        Ok(())
    }

    /// Apply `PARLEY_*` environment variables.
    ///
    /// Variables with the prefix that do not name a known key are ignored.
    pub fn apply_envs<K, V>(&mut self, vars: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in vars {
            let name = name.as_ref();
            if !name.starts_with(ENV_PREFIX) {
                continue;
            }

            let Some(key) = KEYS.iter().find(|key| env_var(key) == name) else {
                trace!(name, "Ignoring unknown environment variable.");
                continue;
            };

            trace!(name, key, "Applying environment variable.");
            self.set(key, value)?;
        }

        Ok(())
    }
}

/// The environment variable overriding `key`.
///
/// `server.port` becomes `PARLEY_SERVER_PORT`.
#[must_use]
pub fn env_var(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.to_ascii_uppercase().replace('.', "_"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
