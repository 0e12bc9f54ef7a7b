//! Validation and decoding of relay request bodies.

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use parley_config::UploadConfig;
use parley_conversation::RelayRequest;
use tracing::debug;

use crate::error::{Error, Result};

/// Accepts base64 with or without trailing padding.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const MIB: usize = 1024 * 1024;

/// A validated relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A text-only exchange.
    Prompt(String),

    /// An exchange about an attached file.
    File {
        /// The prompt sent along with the file, if any.
        prompt: Option<String>,
        attachment: Attachment,
    },
}

/// A decoded file attachment.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Validate a request body and decode its attachment.
///
/// Empty and whitespace-only prompts count as absent, as do empty files.
pub fn validate(request: RelayRequest, config: &UploadConfig) -> Result<Input> {
    let prompt = request
        .prompt
        .map(|prompt| prompt.trim().to_owned())
        .filter(|prompt| !prompt.is_empty());

    let attachment = match request.file.as_deref() {
        Some(file) => decode_file(file, request.mime_type.as_deref(), config)?,
        None => None,
    };

    match (prompt, attachment) {
        (None, None) => Err(Error::Validation("Prompt or file is required.".to_owned())),
        (Some(prompt), None) => Ok(Input::Prompt(prompt)),
        (prompt, Some(attachment)) => Ok(Input::File { prompt, attachment }),
    }
}

/// Decode a base64 file, given either bare or as a `data:` URL.
///
/// The decoded size is checked before any decoding happens. Returns `None` for
/// an empty payload.
pub fn decode_file(
    file: &str,
    mime_type: Option<&str>,
    config: &UploadConfig,
) -> Result<Option<Attachment>> {
    let (url_mime_type, payload) = split_data_url(file)?;

    let payload = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect::<Vec<_>>();

    if payload.is_empty() {
        return Ok(None);
    }

    let size = decoded_len(&payload);
    if size > config.max_bytes {
        return Err(Error::Validation(format!(
            "File is too large ({}). The maximum size is {}.",
            human_size(size),
            human_size(config.max_bytes)
        )));
    }

    let bytes = BASE64
        .decode(&payload)
        .map_err(|error| Error::Validation(format!("File is not valid base64: {error}")))?;

    let mime_type = url_mime_type
        .or(mime_type.map(str::trim).filter(|m| !m.is_empty()))
        .map(ToOwned::to_owned)
        .or_else(|| infer::get(&bytes).map(|kind| kind.mime_type().to_owned()))
        .unwrap_or_else(|| config.default_mime_type.clone());

    debug!(bytes = bytes.len(), %mime_type, "Decoded file attachment.");
    Ok(Some(Attachment { bytes, mime_type }))
}

/// Split a `data:<mime>;base64,<payload>` URL into its MIME type and payload.
///
/// Anything that does not start with `data:` is a bare payload.
fn split_data_url(file: &str) -> Result<(Option<&str>, &str)> {
    let Some(rest) = file.trim_start().strip_prefix("data:") else {
        return Ok((None, file));
    };

    let Some((header, payload)) = rest.split_once(',') else {
        return Err(Error::Validation("File data URL has no payload.".to_owned()));
    };

    let Some(mime_type) = header.strip_suffix(";base64") else {
        return Err(Error::Validation(
            "File data URL must be base64 encoded.".to_owned(),
        ));
    };

    // Drop parameters such as `;charset=utf-8`.
    let mime_type = mime_type.split(';').next().unwrap_or_default().trim();

    Ok(((!mime_type.is_empty()).then_some(mime_type), payload))
}

/// Length of the decoded form of a whitespace-free base64 payload.
fn decoded_len(payload: &[u8]) -> usize {
    let padding = payload.iter().rev().take_while(|&&b| b == b'=').count().min(2);
    (payload.len() * 3 / 4).saturating_sub(padding)
}

fn human_size(bytes: usize) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
