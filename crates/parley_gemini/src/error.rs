use serde_json::Value;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Stream processing error: {0}")]
    Stream(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error (status {code}): {message}")]
    Api {
        code: u16,
        message: String,

        /// Canonical status name, e.g. `INVALID_ARGUMENT`.
        status: Option<String>,
        details: Option<Value>,
    },

    #[error("invalid HTTP header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl Error {
    /// Structured details attached to the error, if any.
    #[must_use]
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Api {
                status, details, ..
            } => match (status, details) {
                (None, None) => None,
                (None, Some(details)) => Some(details.clone()),
                (status, details) => Some(serde_json::json!({
                    "status": status,
                    "details": details,
                })),
            },
            _ => None,
        }
    }
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
