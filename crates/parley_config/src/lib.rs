//! Layered configuration for the Parley relay and CLI.

mod config;
pub(crate) mod error;
mod google;
mod parse;
mod server;
mod session;
mod upload;

use std::str::FromStr;

pub use config::{Config, ENV_PREFIX, KEYS, env_var};
pub use error::Error;
pub use google::GoogleConfig;
pub use parse::{CONFIG_FILE_NAME, build, find_file, load_file, parse_override};
pub use server::ServerConfig;
pub use session::SessionConfig;
pub use upload::{DEFAULT_MAX_BYTES, UploadConfig};

fn set_error(key: &str) -> error::Result<()> {
    Err(Error::UnknownConfigKey {
        key: key.to_owned(),
        available_keys: KEYS.iter().map(ToString::to_string).collect(),
    })
}

fn parse_value<T: FromStr>(
    path: &str,
    value: impl Into<String>,
    need: &str,
) -> error::Result<T> {
    let value = value.into();
    value.trim().parse().map_err(|_| Error::InvalidConfigValue {
        key: path.to_owned(),
        value,
        need: need.to_owned(),
    })
}
