use async_stream::try_stream;
use async_trait::async_trait;
use camino::Utf8Path;
use futures::{Stream, StreamExt as _};
use parley_config::GoogleConfig;
use parley_conversation::Turn;
use parley_gemini::{
    Client, ResponseStream,
    types::{Content, GenerateContentRequest, GenerateContentResponse, Part},
};
use tracing::{debug, trace};

use super::{FragmentStream, RemoteFile, Upstream};
use crate::error::{Error, Result};

/// [`Upstream`] backed by the Gemini API, for a single model.
#[derive(Debug, Clone)]
pub struct GeminiUpstream {
    client: Client,
    model: String,
}

impl GeminiUpstream {
    #[must_use]
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    #[must_use]
    pub fn from_config(api_key: impl Into<String>, config: &GoogleConfig) -> Self {
        let client = Client::new(api_key)
            .with_base_url(&config.base_url)
            .with_api_version(&config.api_version);

        Self::new(client, &config.model)
    }
}

#[async_trait]
impl Upstream for GeminiUpstream {
    async fn chat_stream(&self, history: &[Turn]) -> Result<FragmentStream> {
        let request = GenerateContentRequest::new(history.iter().map(to_content).collect());

        debug!(model = %self.model, turns = history.len(), "Streaming conversation.");
        let chunks = self
            .client
            .stream_generate_content(&self.model, &request)
            .await?;

        Ok(Box::pin(fragments(chunks)))
    }

    async fn upload(&self, path: &Utf8Path, mime_type: &str) -> Result<RemoteFile> {
        let bytes = tokio::fs::read(path).await.map_err(Error::Staging)?;

        debug!(%path, bytes = bytes.len(), mime_type, "Uploading file.");
        let file = self
            .client
            .upload_file(bytes, mime_type, path.file_name())
            .await?;

        Ok(RemoteFile {
            uri: file.uri,
            mime_type: file.mime_type,
        })
    }

    async fn generate_with_file(&self, file: &RemoteFile, instruction: &str) -> Result<String> {
        let request = GenerateContentRequest::new(vec![Content {
            role: None,
            parts: vec![
                Part::file(&file.uri, &file.mime_type),
                Part::text(instruction),
            ],
        }]);

        debug!(model = %self.model, uri = %file.uri, "Generating reply about file.");
        let response = self.client.generate_content(&self.model, &request).await?;
        check_blocked(&response)?;

        Ok(response.text())
    }
}

fn to_content(turn: &Turn) -> Content {
    Content::new(
        turn.role.as_str(),
        turn.parts.iter().map(|part| Part::text(&part.text)).collect(),
    )
}

fn fragments(mut chunks: ResponseStream) -> impl Stream<Item = Result<String>> + Send {
    try_stream! {
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            check_blocked(&chunk)?;

            let text = chunk.text();
            trace!(%text, "Received fragment.");
            if !text.is_empty() {
                yield text;
            }
        }
    }
}

fn check_blocked(response: &GenerateContentResponse) -> Result<()> {
    match response.block_reason() {
        Some(reason) => Err(Error::Upstream {
            message: format!("The prompt was blocked by the model ({reason})."),
            details: None,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "gemini_tests.rs"]
mod tests;
