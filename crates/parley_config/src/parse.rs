use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, trace};

use crate::{Config, Error, error::Result};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "parley.toml";

/// Load a configuration file, with defaults for everything it leaves out.
pub fn load_file(path: &Utf8Path) -> Result<Config> {
    trace!(%path, "Loading configuration file.");

    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|error| Error::Toml {
        path: path.to_string(),
        error,
    })
}

/// Find [`CONFIG_FILE_NAME`] in `dir`, if it exists.
#[must_use]
pub fn find_file(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}

/// Split a `KEY=VALUE` override.
pub fn parse_override(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| Error::InvalidOverride(s.to_owned()))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::InvalidOverride(s.to_owned()));
    }

    Ok((key.to_owned(), value.to_owned()))
}

/// Build the final configuration from all layers.
///
/// Layers are applied in order: defaults, the configuration file, environment
/// variables, then `overrides`. Later layers win.
pub fn build<K, V>(
    file: Option<&Utf8Path>,
    envs: impl IntoIterator<Item = (K, V)>,
    overrides: &[(String, String)],
) -> Result<Config>
where
    K: AsRef<str>,
    V: Into<String>,
{
    let mut config = match file {
        Some(path) => load_file(path)?,
        None => Config::default(),
    };

    config.apply_envs(envs)?;

    for (key, value) in overrides {
        debug!(%key, %value, "Applying configuration override.");
        config.set(key, value.as_str())?;
    }

    Ok(config)
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
