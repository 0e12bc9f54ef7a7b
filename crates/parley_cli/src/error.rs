use std::{io, sync::Arc};

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// CLI Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] parley_config::Error),

    #[error("Relay error: {0}")]
    Relay(#[from] parley_relay::Error),

    #[error("{0}")]
    Client(Arc<parley_client::Error>),

    #[error(transparent)]
    Session(#[from] parley_conversation::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Working directory is not valid UTF-8: {0}")]
    NonUtf8Path(#[from] camino::FromPathBufError),

    #[error("Submission was cancelled.")]
    Cancelled,

    #[error("The model did not reply.")]
    NoReply,
}

impl From<parley_client::Error> for Error {
    fn from(error: parley_client::Error) -> Self {
        Self::Client(Arc::new(error))
    }
}
