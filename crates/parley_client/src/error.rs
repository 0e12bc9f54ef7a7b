use serde_json::Value;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unable to read file {path}: {error}")]
    File {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("File is too large ({size} bytes). The maximum size is {max} bytes.")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Prompt or file is required.")]
    EmptySubmission,

    /// The relay rejected the request.
    #[error("{message}")]
    Relay {
        status: u16,
        message: String,
        details: Option<Value>,
    },
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
