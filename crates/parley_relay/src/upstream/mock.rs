//! Mock upstream for testing relay behavior without real API calls.
//!
//! Replies are scripted in order. Once the script runs out, the mock echoes
//! the last user turn back, which is convenient for concurrency tests where
//! the order of calls is not known up front.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use futures::stream;
use parking_lot::Mutex;
use parley_conversation::Turn;
use serde_json::Value;

use super::{FragmentStream, RemoteFile, Upstream};
use crate::error::{Error, Result};

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Reply with these fragments, in order.
    Fragments(Vec<String>),

    /// Fail with an upstream error.
    Failure {
        message: String,
        details: Option<Value>,
    },
}

/// A file received by [`MockUpstream::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: Utf8PathBuf,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Recorded {
    histories: Vec<Vec<Turn>>,
    uploads: Vec<Upload>,
    instructions: Vec<(RemoteFile, String)>,
}

/// A mock [`Upstream`].
///
/// Clones share their script and recordings.
#[derive(Debug, Clone, Default)]
pub struct MockUpstream {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    recorded: Arc<Mutex<Recorded>>,
    delay: Option<Duration>,
}

impl MockUpstream {
    /// Create a mock that echoes every user turn.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply made of a single fragment.
    #[must_use]
    pub fn with_reply(self, reply: &str) -> Self {
        self.with_fragments(&[reply])
    }

    /// Queue a reply streamed in multiple fragments.
    #[must_use]
    pub fn with_fragments(self, fragments: &[&str]) -> Self {
        let fragments = fragments.iter().map(ToString::to_string).collect();
        self.replies.lock().push_back(Reply::Fragments(fragments));
        self
    }

    /// Queue a failing reply.
    #[must_use]
    pub fn with_failure(self, message: impl Into<String>, details: Option<Value>) -> Self {
        self.replies.lock().push_back(Reply::Failure {
            message: message.into(),
            details,
        });
        self
    }

    /// Wait this long before answering each call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The histories received by [`Upstream::chat_stream`], in call order.
    #[must_use]
    pub fn histories(&self) -> Vec<Vec<Turn>> {
        self.recorded.lock().histories.clone()
    }

    /// The files received by [`Upstream::upload`], in call order.
    #[must_use]
    pub fn uploads(&self) -> Vec<Upload> {
        self.recorded.lock().uploads.clone()
    }

    /// The file and instruction pairs received by
    /// [`Upstream::generate_with_file`].
    #[must_use]
    pub fn instructions(&self) -> Vec<(RemoteFile, String)> {
        self.recorded.lock().instructions.clone()
    }

    async fn next_reply(&self, echo: impl FnOnce() -> String) -> Reply {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Reply::Fragments(vec![echo()]))
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn chat_stream(&self, history: &[Turn]) -> Result<FragmentStream> {
        self.recorded.lock().histories.push(history.to_vec());

        let last = history.last().map(Turn::text).unwrap_or_default();
        match self.next_reply(|| format!("echo: {last}")).await {
            Reply::Fragments(fragments) => Ok(Box::pin(stream::iter(
                fragments.into_iter().map(Ok),
            ))),
            Reply::Failure { message, details } => Err(Error::Upstream { message, details }),
        }
    }

    async fn upload(&self, path: &Utf8Path, mime_type: &str) -> Result<RemoteFile> {
        let bytes = tokio::fs::read(path).await.map_err(Error::Staging)?;
        let uri = format!("mock://files/{}", self.recorded.lock().uploads.len());

        self.recorded.lock().uploads.push(Upload {
            path: path.to_owned(),
            mime_type: mime_type.to_owned(),
            bytes,
        });

        Ok(RemoteFile {
            uri,
            mime_type: mime_type.to_owned(),
        })
    }

    async fn generate_with_file(&self, file: &RemoteFile, instruction: &str) -> Result<String> {
        self.recorded
            .lock()
            .instructions
            .push((file.clone(), instruction.to_owned()));

        let echo = || format!("echo: {instruction} ({})", file.uri);
        match self.next_reply(echo).await {
            Reply::Fragments(fragments) => Ok(fragments.concat()),
            Reply::Failure { message, details } => Err(Error::Upstream { message, details }),
        }
    }
}
