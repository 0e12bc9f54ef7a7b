//! Temporary on-disk staging of uploaded files.

use std::io::{self, Write as _};

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::{Builder, NamedUtf8TempFile};
use tracing::trace;

use crate::error::{Error, Result};

const PREFIX: &str = "parley-upload-";

/// A uniquely named file holding an upload until it is sent upstream.
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedUtf8TempFile,
}

impl StagedFile {
    /// Write `bytes` to a new file in `dir`, or the system temporary directory.
    pub async fn create(bytes: Vec<u8>, dir: Option<Utf8PathBuf>) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::create_blocking(&bytes, dir.as_deref()))
            .await
            .map_err(|error| Error::Staging(io::Error::other(error)))?
            .map_err(Error::Staging)
    }

    fn create_blocking(bytes: &[u8], dir: Option<&Utf8Path>) -> io::Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(PREFIX);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        file.write_all(bytes)?;
        file.flush()?;

        trace!(path = %file.path(), bytes = bytes.len(), "Staged upload.");
        Ok(Self { file })
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.file.path()
    }
}
