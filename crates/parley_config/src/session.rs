use serde::{Deserialize, Serialize};

use crate::{error::Result, set_error};

/// Session tracking configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    pub cookie_name: String,

    /// Name of the request header carrying the session id.
    ///
    /// The header takes precedence over the cookie.
    pub header_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "parley_session".to_owned(),
            header_name: "x-parley-session".to_owned(),
        }
    }
}

impl SessionConfig {
    /// Set a configuration value using a stringified key/value pair.
    pub fn set(&mut self, path: &str, key: &str, value: impl Into<String>) -> Result<()> {
        match key {
            "cookie_name" => self.cookie_name = value.into(),
            "header_name" => self.header_name = value.into(),
            _ => return set_error(path),
        }

        Ok(())
    }
}
