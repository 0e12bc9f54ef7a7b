use std::{sync::Arc, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use parley_conversation::{ErrorBody, RelayRequest, RelayResponse, SessionId};
use reqwest::{Method, RequestBuilder, Response};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

/// Default header carrying the session id.
pub const SESSION_HEADER: &str = "x-parley-session";

/// Largest file the relay accepts by default, 10 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

const RELAY_PATH: &str = "api/relay";

/// A prompt and/or file to send to the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub prompt: Option<String>,
    pub file: Option<Utf8PathBuf>,

    /// MIME type of `file`. Detected by the relay when absent.
    pub mime_type: Option<String>,
}

impl Submission {
    #[must_use]
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// HTTP client for a Parley relay.
///
/// The session issued by the relay on the first response is reused for all
/// later requests. Clones share the session.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Url,
    http_client: reqwest::Client,
    session: Arc<Mutex<Option<SessionId>>>,
    session_header: String,
    timeout: Option<Duration>,
    max_bytes: u64,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            endpoint: base.join(RELAY_PATH)?,
            http_client: reqwest::Client::new(),
            session: Arc::default(),
            session_header: SESSION_HEADER.to_owned(),
            timeout: None,
            max_bytes: DEFAULT_MAX_BYTES,
        })
    }

    #[must_use]
    pub fn with_session(self, session: SessionId) -> Self {
        *self.session.lock() = Some(session);
        self
    }

    /// Send the session id in `name` instead of [`SESSION_HEADER`].
    ///
    /// Must match the relay's `session.header_name`.
    #[must_use]
    pub fn with_session_header(mut self, name: impl Into<String>) -> Self {
        self.session_header = name.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// The current session, if one was set or issued.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.session.lock().clone()
    }

    /// Run one exchange and return the updated transcript.
    pub async fn send(&self, submission: &Submission) -> Result<RelayResponse> {
        let body = self.encode(submission).await?;

        let response = self.request(Method::POST).json(&body).send().await?;
        self.read_response(response).await
    }

    /// Fetch the transcript of the current session.
    pub async fn transcript(&self) -> Result<RelayResponse> {
        let response = self.request(Method::GET).send().await?;
        self.read_response(response).await
    }

    /// Clear the transcript of the current session.
    pub async fn reset(&self) -> Result<()> {
        let response = self.request(Method::DELETE).send().await?;
        check_status(response).await?;

        Ok(())
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let mut request = self.http_client.request(method, self.endpoint.clone());

        if let Some(session) = self.session.lock().as_ref() {
            request = request.header(self.session_header.as_str(), session.as_str());
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request
    }

    async fn read_response(&self, response: Response) -> Result<RelayResponse> {
        let response = check_status(response).await?;
        let body: RelayResponse = response.json().await?;

        trace!(session = %body.session, turns = body.result.len(), "Received transcript.");
        *self.session.lock() = Some(body.session.clone());

        Ok(body)
    }

    async fn encode(&self, submission: &Submission) -> Result<RelayRequest> {
        let prompt = submission
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .map(ToOwned::to_owned);

        let file = match &submission.file {
            Some(path) => Some(self.encode_file(path).await?),
            None => None,
        };

        if prompt.is_none() && file.is_none() {
            return Err(Error::EmptySubmission);
        }

        Ok(RelayRequest {
            prompt,
            file,
            mime_type: submission.mime_type.clone(),
        })
    }

    async fn encode_file(&self, path: &Utf8Path) -> Result<String> {
        let file_error = |error| Error::File {
            path: path.to_string(),
            error,
        };

        // Check the size before reading the whole file.
        let size = tokio::fs::metadata(path).await.map_err(file_error)?.len();
        if size > self.max_bytes {
            return Err(Error::FileTooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(file_error)?;
        debug!(%path, bytes = bytes.len(), "Encoding file.");

        Ok(STANDARD.encode(bytes))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    let ErrorBody { error, details } =
        serde_json::from_str(&body).unwrap_or_else(|_| ErrorBody {
            error: if body.trim().is_empty() {
                format!("request failed with status {}", status.as_u16())
            } else {
                body
            },
            details: None,
        });

    Err(Error::Relay {
        status: status.as_u16(),
        message: error,
        details,
    })
}
