//! OpenAI-compatible backend against a mock HTTP server

use gradebook_api::services::analysis::{AnalysisError, AnalysisGateway, ChildDescriptor, GradeInput};
use gradebook_api::services::llm::{CompletionRequest, LlmBackend, LlmError, Message, OpenAiBackend};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer, api_key: Option<&str>) -> OpenAiBackend {
    OpenAiBackend::new(
        format!("{}/v1", server.uri()),
        "gpt-4o-mini",
        api_key.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn completion(content: Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_complete_sends_chat_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("{\"ok\":true}"))))
        .expect(1)
        .mount(&server)
        .await;

    let response = backend(&server, Some("sk-test"))
        .complete(
            CompletionRequest::new(vec![Message::system("be brief"), Message::user("hello")])
                .with_temperature(0.2)
                .with_json_output(),
        )
        .await
        .unwrap();

    assert_eq!(response.content, "{\"ok\":true}");
    assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
}

#[tokio::test]
async fn test_rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = backend(&server, None)
        .complete(CompletionRequest::new(vec![Message::user("hello")]))
        .await;

    assert!(matches!(result, Err(LlmError::RateLimited)));
}

#[tokio::test]
async fn test_server_error_is_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = backend(&server, None)
        .complete(CompletionRequest::new(vec![Message::user("hello")]))
        .await;

    match result {
        Err(LlmError::RequestFailed(message)) => assert!(message.contains("boom")),
        other => panic!("expected RequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gateway_over_http_degrades_on_plain_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(json!("Error generating analysis"))),
        )
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::new(Arc::new(backend(&server, None)), Duration::from_secs(5));
    let grades: Vec<GradeInput> =
        serde_json::from_value(json!([{"subject": "Math", "value": 12}])).unwrap();

    let completed = gateway
        .analyze(&ChildDescriptor::default(), &grades)
        .await
        .unwrap();

    assert!(completed.outcome.is_degraded());
    assert_eq!(completed.outcome.report().overview.summary, "Error generating analysis");
    assert_eq!(completed.model, "gpt-4o-mini-2024-07-18");
}

#[tokio::test]
async fn test_gateway_over_http_null_content_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(Value::Null)))
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::new(Arc::new(backend(&server, None)), Duration::from_secs(5));
    let grades: Vec<GradeInput> =
        serde_json::from_value(json!([{"subject": "Math", "value": 12}])).unwrap();

    let result = gateway.analyze(&ChildDescriptor::default(), &grades).await;

    assert!(matches!(result, Err(AnalysisError::EmptyResponse)));
}

#[tokio::test]
async fn test_gateway_over_http_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(json!("{}")))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::new(Arc::new(backend(&server, None)), Duration::from_millis(50));
    let grades: Vec<GradeInput> =
        serde_json::from_value(json!([{"subject": "Math", "value": 12}])).unwrap();

    let result = gateway.analyze(&ChildDescriptor::default(), &grades).await;

    assert!(matches!(result, Err(AnalysisError::Timeout(_))));
}
