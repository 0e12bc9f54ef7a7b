use base64::{Engine as _, engine::general_purpose::STANDARD};
use pretty_assertions::assert_eq;

use super::*;

const PDF: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn config() -> UploadConfig {
    UploadConfig::default()
}

fn request(prompt: Option<&str>, file: Option<&str>, mime_type: Option<&str>) -> RelayRequest {
    RelayRequest {
        prompt: prompt.map(ToOwned::to_owned),
        file: file.map(ToOwned::to_owned),
        mime_type: mime_type.map(ToOwned::to_owned),
    }
}

#[test]
fn test_validate_requires_prompt_or_file() {
    let missing = Error::Validation("Prompt or file is required.".to_owned());

    let cases = vec![
        ("nothing", request(None, None, None)),
        ("empty prompt", request(Some(""), None, None)),
        ("blank prompt", request(Some(" \n\t "), None, None)),
        ("empty file", request(Some(" "), Some(""), None)),
        ("blank file", request(None, Some(" \n "), None)),
        ("empty data url", request(None, Some("data:application/pdf;base64,"), None)),
    ];

    for (name, case) in cases {
        assert_eq!(validate(case, &config()).unwrap_err(), missing, "{name}");
    }
}

#[test]
fn test_validate_prompt_is_trimmed() {
    assert_eq!(
        validate(request(Some("  Hi there \n"), None, None), &config()).unwrap(),
        Input::Prompt("Hi there".to_owned())
    );
}

#[test]
fn test_validate_file_with_and_without_prompt() {
    let file = STANDARD.encode(PDF);

    let Input::File { prompt, attachment } =
        validate(request(Some("What is this?"), Some(&file), None), &config()).unwrap()
    else {
        panic!("expected a file input");
    };
    assert_eq!(prompt.as_deref(), Some("What is this?"));
    assert_eq!(attachment.bytes, PDF);

    let Input::File { prompt, .. } =
        validate(request(Some(""), Some(&file), None), &config()).unwrap()
    else {
        panic!("expected a file input");
    };
    assert_eq!(prompt, None);
}

#[test]
fn test_decode_mime_type_resolution() {
    let png = STANDARD.encode(PNG);
    let unknown = STANDARD.encode(b"just some bytes");

    let cases = vec![
        (
            "data url wins",
            format!("data:image/webp;base64,{png}"),
            Some("text/plain"),
            "image/webp",
        ),
        (
            "data url parameters dropped",
            format!("data:text/plain;charset=utf-8;base64,{unknown}"),
            None,
            "text/plain",
        ),
        ("field", unknown.clone(), Some(" text/csv "), "text/csv"),
        ("sniffed", png.clone(), None, "image/png"),
        ("blank field sniffed", png, Some(""), "image/png"),
        ("default", unknown, None, "application/pdf"),
    ];

    for (name, file, mime_type, expected) in cases {
        let attachment = decode_file(&file, mime_type, &config())
            .unwrap()
            .unwrap();
        assert_eq!(attachment.mime_type, expected, "{name}");
    }
}

#[test]
fn test_decode_ignores_whitespace_and_missing_padding() {
    let encoded = STANDARD.encode(b"hello world!?");
    let wrapped = format!(" {}\n{} ", &encoded[..8], &encoded[8..]);
    let unpadded = encoded.trim_end_matches('=');

    for file in [wrapped.as_str(), unpadded] {
        let attachment = decode_file(file, None, &config()).unwrap().unwrap();
        assert_eq!(attachment.bytes, b"hello world!?");
    }
}

#[test]
fn test_decode_rejects_invalid_base64() {
    for file in ["not base64!", "data:image/png;base64,@@@@", "QUJD*"] {
        let error = decode_file(file, None, &config()).unwrap_err();
        assert!(
            matches!(&error, Error::Validation(message) if message.starts_with("File is not valid base64")),
            "{file}: {error:?}"
        );
    }
}

#[test]
fn test_decode_rejects_malformed_data_url() {
    assert_eq!(
        decode_file("data:text/plain,hello", None, &config()).unwrap_err(),
        Error::Validation("File data URL must be base64 encoded.".to_owned())
    );
    assert_eq!(
        decode_file("data:text/plain;base64", None, &config()).unwrap_err(),
        Error::Validation("File data URL has no payload.".to_owned())
    );
}

#[test]
fn test_decode_size_limit() {
    let mut config = config();
    config.max_bytes = 12;

    let at_limit = STANDARD.encode([7_u8; 12]);
    let attachment = decode_file(&at_limit, None, &config).unwrap().unwrap();
    assert_eq!(attachment.bytes.len(), 12);

    let over_limit = STANDARD.encode([7_u8; 13]);
    assert_eq!(
        decode_file(&over_limit, None, &config).unwrap_err(),
        Error::Validation("File is too large (13 bytes). The maximum size is 12 bytes.".to_owned())
    );
}

#[test]
fn test_decode_rejects_oversized_file_before_decoding() {
    // One byte over 10 MiB. The trailing garbage would fail decoding, so the
    // size check must come first.
    let mut file = STANDARD.encode(vec![0_u8; config().max_bytes + 1]);
    file.push_str("!!!!");

    let error = decode_file(&file, None, &config()).unwrap_err();
    assert!(
        matches!(&error, Error::Validation(message) if message.ends_with("The maximum size is 10 MiB.")),
        "{error:?}"
    );
}

#[test]
fn test_decoded_len_matches_decoder() {
    for len in 0..32 {
        let encoded = STANDARD.encode(vec![1_u8; len]);
        assert_eq!(decoded_len(encoded.as_bytes()), len, "len {len}");
        assert_eq!(
            decoded_len(encoded.trim_end_matches('=').as_bytes()),
            len,
            "unpadded len {len}"
        );
    }
}
