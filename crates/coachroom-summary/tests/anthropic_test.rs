use coachroom_summary::{
    AnthropicClient, ExtractError, GenerationRequest, SummaryConfig, SummaryExtractor,
    TextGenerator, UpstreamError, SUMMARY_INSTRUCTIONS,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> SummaryConfig {
    let mut config = SummaryConfig::new("test-key");
    config.base_url = server.uri();
    config
}

#[tokio::test]
async fn sends_document_block_and_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-haiku-4-5",
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text" },
                    {
                        "type": "document",
                        "source": {
                            "type": "base64",
                            "media_type": "application/pdf",
                            "data": "JVBERi0xLjc="
                        }
                    }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": "Backend engineer with 6 years in payments." }],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&config_for(&server)).unwrap();
    let text = client
        .generate(&GenerationRequest {
            instructions: SUMMARY_INSTRUCTIONS,
            attachment: b"%PDF-1.7",
            media_type: "application/pdf",
        })
        .await
        .unwrap();

    assert_eq!(text, "Backend engineer with 6 years in payments.");
}

#[tokio::test]
async fn provider_error_message_is_carried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" }
        })))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&config_for(&server)).unwrap();
    let result = client
        .generate(&GenerationRequest {
            instructions: SUMMARY_INSTRUCTIONS,
            attachment: b"%PDF-1.7",
            media_type: "application/pdf",
        })
        .await;

    match result {
        Err(UpstreamError::Status { status, message }) => {
            assert_eq!(status, 529);
            assert_eq!(message, "Overloaded");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn response_without_text_blocks_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "tool_use", "id": "t1", "name": "x", "input": {} }]
        })))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&config_for(&server)).unwrap();
    let result = client
        .generate(&GenerationRequest {
            instructions: SUMMARY_INSTRUCTIONS,
            attachment: b"%PDF-1.7",
            media_type: "application/pdf",
        })
        .await;

    assert!(matches!(result, Err(UpstreamError::EmptyResponse)));
}

#[tokio::test]
async fn missing_api_key_never_calls_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.api_key.clear();
    let client = AnthropicClient::new(&config).unwrap();
    let result = client
        .generate(&GenerationRequest {
            instructions: SUMMARY_INSTRUCTIONS,
            attachment: b"%PDF-1.7",
            media_type: "application/pdf",
        })
        .await;

    assert!(matches!(result, Err(UpstreamError::NotConfigured)));
}

#[tokio::test]
async fn extractor_with_anthropic_client_produces_bounded_artifact() {
    let server = MockServer::start().await;
    let long_reply = "Platform engineer. ".repeat(400);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": long_reply }]
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = Arc::new(AnthropicClient::new(&config).unwrap());
    let extractor = SummaryExtractor::new(client, &config);

    let document = vec![b'%'; 2 * 1024 * 1024];
    let artifact = extractor.extract(&document, "application/pdf").await.unwrap();
    assert!(!artifact.payload().is_empty());
    assert!(artifact.payload().len() <= config.max_summary_bytes);
    assert!(artifact.payload().starts_with("Platform engineer."));
}

#[tokio::test]
async fn extractor_rejects_oversized_upload_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let extractor = SummaryExtractor::new(Arc::new(AnthropicClient::new(&config).unwrap()), &config);

    let document = vec![0u8; 11 * 1024 * 1024];
    let result = extractor.extract(&document, "application/pdf").await;
    assert!(matches!(result, Err(ExtractError::Validation(_))));
}
