//! JSON bodies exchanged with the relay endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{session::SessionId, transcript::Transcript};

/// Body of a `POST /api/relay` request.
///
/// At least one of `prompt` and `file` must be present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Base64 file content, either bare or as a `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl RelayRequest {
    #[must_use]
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }
}

/// Body of a successful relay response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    /// The full transcript of the session.
    pub result: Transcript,

    /// Formatted HTML of each turn in `result`, by index.
    #[serde(default)]
    pub html: Vec<String>,

    pub session: SessionId,
}

/// Body of a failed relay response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_accepts_partial_bodies() {
        let request: RelayRequest =
            serde_json::from_value(json!({ "file": "AAAA", "mimeType": "image/png" })).unwrap();

        assert_eq!(request, RelayRequest {
            prompt: None,
            file: Some("AAAA".to_owned()),
            mime_type: Some("image/png".to_owned()),
        });

        assert_eq!(
            serde_json::to_value(RelayRequest::prompt("Hi")).unwrap(),
            json!({ "prompt": "Hi" })
        );
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let body = ErrorBody {
            error: "Prompt or file is required.".to_owned(),
            details: None,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "error": "Prompt or file is required." })
        );
    }
}
