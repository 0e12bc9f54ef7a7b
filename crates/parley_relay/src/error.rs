use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parley_conversation::ErrorBody;
use serde_json::Value;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request is malformed or violates a limit.
    #[error("{0}")]
    Validation(String),

    /// The server is missing required configuration.
    #[error("{0}")]
    Configuration(String),

    /// The model API call failed.
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<Value>,
    },

    #[error("Unable to stage uploaded file: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Invalid session: {0}")]
    Session(#[from] parley_conversation::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Session(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Upstream { .. } | Self::Staging(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Upstream { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            details: self.details().cloned(),
        }
    }
}

impl From<parley_gemini::Error> for Error {
    fn from(error: parley_gemini::Error) -> Self {
        let details = error.details();
        let message = match error {
            parley_gemini::Error::Api { message, .. } => message,
            error => error.to_string(),
        };

        Self::Upstream { message, details }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "Relay request failed.");
        } else {
            warn!(%status, error = %self, "Relay request rejected.");
        }

        (status, Json(self.to_body())).into_response()
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
