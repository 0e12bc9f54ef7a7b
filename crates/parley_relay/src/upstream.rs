pub mod gemini;
pub mod mock;

use std::pin::Pin;

use async_trait::async_trait;
use camino::Utf8Path;
use futures::Stream;
use parley_conversation::Turn;

pub use self::gemini::GeminiUpstream;
use crate::error::Result;

/// A stream of reply text fragments, in order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A file stored with the upstream model API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// The URI to reference the file with.
    pub uri: String,
    pub mime_type: String,
}

/// The generative model service a relay forwards conversations to.
#[async_trait]
pub trait Upstream: std::fmt::Debug + Send + Sync {
    /// Stream the reply to a conversation.
    ///
    /// `history` is the full conversation, ending with the new user turn.
    async fn chat_stream(&self, history: &[Turn]) -> Result<FragmentStream>;

    /// Upload the file at `path` for use in later requests.
    async fn upload(&self, path: &Utf8Path, mime_type: &str) -> Result<RemoteFile>;

    /// Generate a single reply about `file`.
    async fn generate_with_file(&self, file: &RemoteFile, instruction: &str) -> Result<String>;
}
