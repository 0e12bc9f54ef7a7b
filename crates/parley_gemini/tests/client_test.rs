use futures::StreamExt as _;
use httpmock::prelude::*;
use parley_gemini::{
    Client, Error,
    types::{Content, GenerateContentRequest, Part},
};
use pretty_assertions::assert_eq;
use serde_json::json;

const MODEL: &str = "gemini-test";

fn client(server: &MockServer) -> Client {
    Client::new("test-key").with_base_url(server.base_url())
}

fn conversation() -> GenerateContentRequest {
    GenerateContentRequest::new(vec![
        Content::new("user", vec![Part::text("Hi")]),
        Content::new("model", vec![Part::text("Hello!")]),
        Content::new("user", vec![Part::text("How are you?")]),
    ])
}

#[test_log::test(tokio::test)]
async fn stream_generate_content_yields_chunks_in_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/v1beta/models/{MODEL}:streamGenerateContent"))
                .query_param("alt", "sse")
                .header("x-goog-api-key", "test-key")
                .body_contains(r#""role":"model""#);
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(concat!(
                    "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"I am \"}]}}]}\r\n\r\n",
                    "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"fine.\"}]},\"finishReason\":\"STOP\"}]}\r\n\r\n",
                ));
        })
        .await;

    let mut stream = client(&server)
        .stream_generate_content(MODEL, &conversation())
        .await
        .unwrap();

    let mut text = vec![];
    while let Some(chunk) = stream.next().await {
        text.push(chunk.unwrap().text());
    }

    assert_eq!(text, vec!["I am ", "fine."]);
    mock.assert_async().await;
}

#[test_log::test(tokio::test)]
async fn stream_generate_content_surfaces_mid_stream_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/v1beta/models/{MODEL}:streamGenerateContent"));
            then.status(200).body(concat!(
                "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"partial\"}]}}]}\n\n",
                "data: {\"error\":{\"code\":500,\"message\":\"Internal error\",\"status\":\"INTERNAL\"}}\n\n",
            ));
        })
        .await;

    let results = client(&server)
        .stream_generate_content(MODEL, &conversation())
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().text(), "partial");
    assert!(matches!(
        &results[1],
        Err(Error::Api { code: 500, message, .. }) if message == "Internal error"
    ));
}

#[test_log::test(tokio::test)]
async fn stream_generate_content_maps_error_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/v1beta/models/{MODEL}:streamGenerateContent"));
            then.status(400).json_body(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT",
                    "details": [{ "reason": "API_KEY_INVALID" }]
                }
            }));
        })
        .await;

    let Err(error) = client(&server)
        .stream_generate_content(MODEL, &conversation())
        .await
    else {
        panic!("request should fail");
    };

    match &error {
        Error::Api {
            code,
            message,
            status,
            details,
        } => {
            assert_eq!(*code, 400);
            assert_eq!(message, "API key not valid. Please pass a valid API key.");
            assert_eq!(status.as_deref(), Some("INVALID_ARGUMENT"));
            assert_eq!(details, &Some(json!([{ "reason": "API_KEY_INVALID" }])));
        }
        other => panic!("unexpected error variant: {other:?}"),
    }

    assert_eq!(
        error.details(),
        Some(json!({
            "status": "INVALID_ARGUMENT",
            "details": [{ "reason": "API_KEY_INVALID" }],
        }))
    );
}

#[test_log::test(tokio::test)]
async fn generate_content_with_file_reference() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/v1beta/models/{MODEL}:generateContent"))
                .json_body(json!({
                    "contents": [{
                        "parts": [
                            { "fileData": { "mimeType": "application/pdf", "fileUri": "https://files.example/abc" } },
                            { "text": "Summarize this file." }
                        ]
                    }]
                }));
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "A short summary." }] },
                    "finishReason": "STOP"
                }]
            }));
        })
        .await;

    let request = GenerateContentRequest::new(vec![Content {
        role: None,
        parts: vec![
            Part::file("https://files.example/abc", "application/pdf"),
            Part::text("Summarize this file."),
        ],
    }]);

    let response = client(&server)
        .generate_content(MODEL, &request)
        .await
        .unwrap();

    assert_eq!(response.text(), "A short summary.");
    mock.assert_async().await;
}

#[test_log::test(tokio::test)]
async fn upload_file_sends_multipart_related_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/upload/v1beta/files")
                .header("x-goog-api-key", "test-key")
                .header("x-goog-upload-protocol", "multipart")
                .body_contains("Content-Type: application/pdf")
                .body_contains("%PDF-1.4 test")
                .body_contains(r#"{"file":{"displayName":"report.pdf"}}"#);
            then.status(200).json_body(json!({
                "file": {
                    "name": "files/abc-123",
                    "displayName": "report.pdf",
                    "mimeType": "application/pdf",
                    "sizeBytes": "13",
                    "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc-123",
                    "state": "ACTIVE"
                }
            }));
        })
        .await;

    let file = client(&server)
        .upload_file(b"%PDF-1.4 test".to_vec(), "application/pdf", Some("report.pdf"))
        .await
        .unwrap();

    assert_eq!(file.name, "files/abc-123");
    assert_eq!(
        file.uri,
        "https://generativelanguage.googleapis.com/v1beta/files/abc-123"
    );
    assert_eq!(file.mime_type, "application/pdf");
    mock.assert_async().await;
}

#[test_log::test(tokio::test)]
async fn upload_file_maps_non_json_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/upload/v1beta/files");
            then.status(503).body("");
        })
        .await;

    let error = client(&server)
        .upload_file(vec![1, 2, 3], "application/octet-stream", None)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Api { code: 503, ref message, .. } if message == "request failed with status 503"
    ));
}
