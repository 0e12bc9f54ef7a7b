use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::{error::Result, parse_value, set_error};

/// Maximum decoded size of an uploaded file, 10 MiB.
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// File upload configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Maximum size of a decoded file, in bytes.
    pub max_bytes: usize,

    /// Directory to stage uploads in before they are sent upstream.
    ///
    /// Defaults to the system temporary directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<Utf8PathBuf>,

    /// MIME type used when none is given and none can be detected.
    pub default_mime_type: String,

    /// Instruction sent with a file when the prompt is empty.
    pub default_instruction: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            staging_dir: None,
            default_mime_type: "application/pdf".to_owned(),
            default_instruction: "Summarize this file.".to_owned(),
        }
    }
}

impl UploadConfig {
    /// Set a configuration value using a stringified key/value pair.
    pub fn set(&mut self, path: &str, key: &str, value: impl Into<String>) -> Result<()> {
        match key {
            "max_bytes" => self.max_bytes = parse_value(path, value, "a number of bytes")?,
            "staging_dir" => {
                let value = value.into();
                self.staging_dir = (!value.is_empty()).then(|| Utf8PathBuf::from(value));
            }
            "default_mime_type" => self.default_mime_type = value.into(),
            "default_instruction" => self.default_instruction = value.into(),
            _ => return set_error(path),
        }

        Ok(())
    }
}
