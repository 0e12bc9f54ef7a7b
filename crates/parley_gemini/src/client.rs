use std::{fmt, io, pin::Pin};

use futures::{Stream, StreamExt as _, TryStreamExt as _};
use reqwest::{
    Response,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::{
    codec::{FramedRead, LinesCodec},
    io::StreamReader,
};
use tracing::{error, trace};

use crate::{
    error::{Error, Result},
    types::{ErrorResponse, File, GenerateContentRequest, GenerateContentResponse, UploadResponse},
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_PROTOCOL_HEADER: &str = "x-goog-upload-protocol";

/// A stream of partial responses from `streamGenerateContent`.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

#[derive(Clone)]
pub struct Client {
    api_key: String,
    base_url: String,
    api_version: String,
    http_client: reqwest::Client,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl Client {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            http_client: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Generate a complete response in a single call.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.model_url(model, "generateContent");
        let response = self.post_json(&url, request).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(Into::into)
    }

    /// Generate a response as a stream of partial responses.
    ///
    /// Errors before the first byte is received are returned directly. Errors
    /// reported by the API in the middle of the stream are yielded as
    /// [`Error::Api`] items.
    pub async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ResponseStream> {
        let url = format!(
            "{}?alt=sse",
            self.model_url(model, "streamGenerateContent")
        );
        let response = self.post_json(&url, request).await?;

        let byte_stream = response.bytes_stream().map_err(io::Error::other);
        let lines = FramedRead::new(StreamReader::new(byte_stream), LinesCodec::new());

        let chunks = lines
            .map_err(|e| Error::Stream(format!("Stream error: {e}")))
            .filter_map(|line| async move {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => return Some(Err(error)),
                };

                // Each event payload is on a single `data:` line.
                let data = line.trim().strip_prefix("data:")?.trim();
                if data.is_empty() {
                    return None;
                }

                Some(parse_chunk(data))
            });

        Ok(Box::pin(chunks))
    }

    /// Upload a file to the Files API.
    ///
    /// The returned [`File::uri`] can be referenced in subsequent requests.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> Result<File> {
        let url = format!("{}/upload/{}/files", self.base_url, self.api_version);
        let boundary = format!("parley-{}", uuid::Uuid::new_v4().simple());

        let metadata = match display_name {
            Some(name) => serde_json::json!({ "file": { "displayName": name } }),
            None => serde_json::json!({ "file": {} }),
        };
        let mut body = Vec::with_capacity(bytes.len() + 512);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
                 --{boundary}\r\nContent-Type: {mime_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let mut headers = self.build_headers()?;
        headers.insert(UPLOAD_PROTOCOL_HEADER, HeaderValue::from_static("multipart"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&format!("multipart/related; boundary={boundary}"))?,
        );

        trace!(%url, size = bytes.len(), mime_type, "Uploading file.");
        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        let UploadResponse { file } = serde_json::from_str(&body)?;

        trace!(name = %file.name, uri = %file.uri, "File uploaded.");
        Ok(file)
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/{}/models/{model}:{method}",
            self.base_url, self.api_version
        )
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(&self.api_key)?);
        Ok(headers)
    }

    async fn post_json<B: Serialize>(&self, url: &str, body: &B) -> Result<Response> {
        let mut headers = self.build_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        trace!(
            %url,
            body = serde_json::to_string(body).unwrap_or_default(),
            "Triggering request."
        );

        let response = self
            .http_client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        trace!(
            status = response.status().as_u16(),
            content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .map(|v| v.to_str().unwrap_or_default()),
            "Received response."
        );

        check_status(response).await
    }
}

/// Turn non-success responses into [`Error::Api`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    error!(status = status.as_u16(), body, "Unexpected response.");

    Err(match parse_json::<ErrorResponse>(&body) {
        Ok(ErrorResponse { error }) => Error::Api {
            code: error.code,
            message: error.message,
            status: error.status,
            details: error.details,
        },
        Err(_) => Error::Api {
            code: status.as_u16(),
            message: if body.trim().is_empty() {
                format!("request failed with status {}", status.as_u16())
            } else {
                body
            },
            status: None,
            details: None,
        },
    })
}

fn parse_chunk(chunk: &str) -> Result<GenerateContentResponse> {
    // Every field of a response is optional, so an error payload would parse
    // as an empty response. Check for errors first.
    let Ok(ErrorResponse { error }) = parse_json::<ErrorResponse>(chunk) else {
        return parse_json(chunk);
    };

    Err(Error::Api {
        code: error.code,
        message: error.message,
        status: error.status,
        details: error.details,
    })
}

fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T> {
    serde_json::from_str(s).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_model_url() {
        let client = Client::new("key").with_base_url("http://localhost:1234/");

        assert_eq!(
            client.model_url("gemini-1.5-flash", "generateContent"),
            "http://localhost:1234/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(
            client.model_url("models/gemini-pro", "streamGenerateContent"),
            "http://localhost:1234/v1beta/models/gemini-pro:streamGenerateContent"
        );
    }

    #[test]
    fn test_parse_chunk_error_payload() {
        let chunk = r#"{"error":{"code":429,"message":"Resource exhausted","status":"RESOURCE_EXHAUSTED"}}"#;

        assert_eq!(
            parse_chunk(chunk).unwrap_err(),
            Error::Api {
                code: 429,
                message: "Resource exhausted".to_owned(),
                status: Some("RESOURCE_EXHAUSTED".to_owned()),
                details: None,
            }
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = Client::new("super-secret");
        assert!(!format!("{client:?}").contains("super-secret"));
    }
}
