//! HTTP client tests against a mock server.

use chat_core::{Message, ModelDescriptor};
use completion_client::{
    ClientConfig, ClientError, CompletionBackend, CompletionClient, CompletionRequest,
    StreamDecoder,
};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_request() -> CompletionRequest {
    CompletionRequest {
        model: ModelDescriptor::fallback(),
        messages: vec![Message::user("Hello")],
        key: "sk-test".to_string(),
        prompt: "be helpful".to_string(),
    }
}

#[tokio::test]
async fn test_fetch_models_parses_listing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/models"))
        .and(body_json(json!({ "key": "sk-test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "gpt-4", "name": "GPT-4", "maxLength": 24000, "tokenLimit": 8000 }
        ])))
        .mount(&server)
        .await;

    let client = CompletionClient::new(ClientConfig::new(server.uri()));
    let models = client.fetch_models("sk-test").await.unwrap();

    assert_eq!(models.len(), 1);
    assert_eq!(models[0].id, "gpt-4");
    assert_eq!(models[0].token_limit, 8000);
}

#[tokio::test]
async fn test_fetch_models_extracts_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": "invalid_api_key", "message": "Incorrect API key provided" }
        })))
        .mount(&server)
        .await;

    let client = CompletionClient::new(ClientConfig::new(server.uri()));
    let err = client.fetch_models("sk-test").await.unwrap_err();

    match err {
        ClientError::ModelFetchFailed(body) => {
            assert_eq!(body.code.as_deref(), Some("invalid_api_key"));
            assert_eq!(body.message_lines, vec!["Incorrect API key provided"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_models_unparsable_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/models"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = CompletionClient::new(ClientConfig::new(server.uri()));
    let err = client.fetch_models("sk-test").await.unwrap_err();

    match err {
        ClientError::ModelFetchFailed(body) => {
            assert!(body.code.is_none());
            assert_eq!(body.message_lines.len(), 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_send_completion_streams_reply_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Hello world"))
        .mount(&server)
        .await;

    let client = CompletionClient::new(ClientConfig::new(server.uri()));
    let mut stream = client.send_completion(&completion_request()).await.unwrap();

    let mut decoder = StreamDecoder::new();
    while let Some(chunk) = stream.next().await {
        decoder.push(&chunk.unwrap());
    }
    assert_eq!(decoder.text(), "Hello world");
}

#[tokio::test]
async fn test_send_completion_non_success_is_request_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let client = CompletionClient::new(ClientConfig::new(server.uri()));
    let err = match client.send_completion(&completion_request()).await {
        Ok(_) => panic!("expected error"),
        Err(e) => e,
    };

    assert!(matches!(err, ClientError::RequestFailed(_)));
}
