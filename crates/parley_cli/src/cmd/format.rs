use camino::Utf8PathBuf;

use crate::{cmd::Success, error::Result, read_input};

#[derive(Debug, clap::Args)]
pub(crate) struct Format {
    /// File to render. Reads from stdin when omitted.
    file: Option<Utf8PathBuf>,
}

impl Format {
    pub(crate) fn run(&self) -> Result<Success> {
        let input = read_input(self.file.as_deref())?;
        Ok(parley_format::to_html(&input).into())
    }
}

#[cfg(test)]
mod tests {
    use camino_tempfile::NamedUtf8TempFile;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_format_file() {
        let file = NamedUtf8TempFile::new().unwrap();
        std::fs::write(file.path(), "Run `cargo test`.").unwrap();

        let output = Format {
            file: Some(file.path().to_owned()),
        }
        .run()
        .unwrap();

        assert_eq!(
            output,
            Success::Message(r#"<p>Run <code class="inline-code">cargo test</code>.</p>"#.to_owned())
        );
    }
}
