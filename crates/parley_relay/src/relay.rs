//! The relay service: one exchange per request, per session.

use std::sync::Arc;

use futures::StreamExt as _;
use parley_config::{Config, UploadConfig};
use parley_conversation::{RelayRequest, SessionId, Transcript, Turn};
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    payload::{self, Attachment, Input},
    staging::StagedFile,
    store::{SessionHandle, SessionStore},
    upstream::{GeminiUpstream, Upstream},
};

const MISSING_API_KEY: &str = "API key is missing. Check your environment variables.";

/// The model backend of a relay.
#[derive(Debug, Clone)]
enum Backend {
    Ready(Arc<dyn Upstream>),

    /// No credential was available at startup. Every exchange fails.
    Unconfigured { api_key_env: String },
}

/// Relays conversations to an [`Upstream`] and keeps their transcripts.
#[derive(Debug)]
pub struct Relay {
    backend: Backend,
    store: SessionStore,
    upload: UploadConfig,
}

impl Relay {
    #[must_use]
    pub fn new(upstream: Arc<dyn Upstream>, upload: UploadConfig) -> Self {
        Self {
            backend: Backend::Ready(upstream),
            store: SessionStore::new(),
            upload,
        }
    }

    /// A relay without a credential. Every exchange fails with a
    /// configuration error naming `api_key_env`.
    #[must_use]
    pub fn unconfigured(api_key_env: impl Into<String>, upload: UploadConfig) -> Self {
        Self {
            backend: Backend::Unconfigured {
                api_key_env: api_key_env.into(),
            },
            store: SessionStore::new(),
            upload,
        }
    }

    /// Build a relay backed by the Gemini API.
    ///
    /// The API key is read from the configured environment variable once.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let upload = config.upload.clone();

        match config.google.api_key() {
            Some(api_key) => {
                info!(model = %config.google.model, "Relaying to Gemini.");
                let upstream = GeminiUpstream::from_config(api_key, &config.google);
                Self::new(Arc::new(upstream), upload)
            }
            None => {
                warn!(
                    env = %config.google.api_key_env,
                    "API key is not set, relay requests will fail."
                );
                Self::unconfigured(&config.google.api_key_env, upload)
            }
        }
    }

    #[must_use]
    pub fn upload_config(&self) -> &UploadConfig {
        &self.upload
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Fail unless a credential is available.
    pub fn ensure_configured(&self) -> Result<&dyn Upstream> {
        match &self.backend {
            Backend::Ready(upstream) => Ok(upstream.as_ref()),
            Backend::Unconfigured { api_key_env } => {
                debug!(env = %api_key_env, "Rejecting request without API key.");
                Err(Error::Configuration(MISSING_API_KEY.to_owned()))
            }
        }
    }

    /// Run one exchange in `session` and return the updated transcript.
    ///
    /// The transcript gains exactly one user turn and one model turn on
    /// success, and is left untouched on failure. A session that is still
    /// empty after a failed exchange is not kept.
    pub async fn exchange(&self, session: &SessionId, request: RelayRequest) -> Result<Transcript> {
        let upstream = self.ensure_configured()?;
        let input = payload::validate(request, &self.upload)?;

        let handle = self.store.session(session);
        let result = self.exchange_in(&handle, upstream, input).await;
        drop(handle);

        match &result {
            Ok(transcript) => {
                info!(session = %session, turns = transcript.len(), "Exchange completed.");
            }
            Err(_) => {
                self.store.discard_if_empty(session);
            }
        }

        result
    }

    async fn exchange_in(
        &self,
        handle: &SessionHandle,
        upstream: &dyn Upstream,
        input: Input,
    ) -> Result<Transcript> {
        let mut transcript = handle.lock().await;

        let (user, reply) = match input {
            Input::Prompt(prompt) => {
                let user = Turn::user(prompt);
                let reply = chat(upstream, &transcript, &user).await?;
                (user, reply)
            }
            Input::File { prompt, attachment } => {
                self.file_exchange(upstream, prompt, attachment).await?
            }
        };

        transcript.push_exchange(user, Turn::model(reply));
        Ok(transcript.clone())
    }

    /// The transcript of `session`.
    pub async fn transcript(&self, session: &SessionId) -> Transcript {
        self.store.snapshot(session).await
    }

    /// Drop the transcript of `session`.
    pub fn reset(&self, session: &SessionId) -> bool {
        self.store.remove(session)
    }

    async fn file_exchange(
        &self,
        upstream: &dyn Upstream,
        prompt: Option<String>,
        attachment: Attachment,
    ) -> Result<(Turn, String)> {
        let Attachment { bytes, mime_type } = attachment;
        let staged = StagedFile::create(bytes, self.upload.staging_dir.clone()).await?;

        let file = upstream.upload(staged.path(), &mime_type).await?;
        drop(staged);

        let instruction = prompt.unwrap_or_else(|| self.upload.default_instruction.clone());
        let reply = upstream.generate_with_file(&file, &instruction).await?;

        let user = Turn::user(format!("{instruction}\n\n[attached file: {}]", file.uri));
        Ok((user, reply))
    }
}

async fn chat(
    upstream: &dyn Upstream,
    transcript: &Transcript,
    user: &Turn,
) -> Result<String> {
    let history = transcript.history_with(user);
    let mut fragments = upstream.chat_stream(&history).await?;

    let mut reply = String::new();
    while let Some(fragment) = fragments.next().await {
        reply.push_str(&fragment?);
    }

    debug!(bytes = reply.len(), "Collected reply.");
    Ok(reply)
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
