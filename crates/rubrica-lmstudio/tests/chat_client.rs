//! Integration tests for ChatCompletionClient.
//!
//! Uses wiremock as a stand-in model server. Covers the request body, content
//! extraction, status and transport failures, and full evaluations through
//! the Evaluator.

use std::time::Duration;

use rubrica_core::{
    Criterion, EvaluationOutcome, EvaluationRequest, Evaluator, FailureKind, PromptVariant,
};
use rubrica_lmstudio::{ChatCompletionClient, ChatMessage, GradingError, GradingProvider, LmStudioConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client(mock_server: &MockServer) -> ChatCompletionClient {
    let config = LmStudioConfig::new(mock_server.uri(), "test-model")
        .with_timeout(Duration::from_secs(5));
    ChatCompletionClient::new(config).expect("failed to create client")
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
}

fn messages() -> Vec<ChatMessage> {
    vec![ChatMessage::system("rubrica"), ChatMessage::user("resumen")]
}

#[tokio::test]
async fn test_sends_chat_completion_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "rubrica"},
                {"role": "user", "content": "resumen"}
            ],
            "temperature": 0.2,
            "stream": false
        })))
        .respond_with(completion("hola"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let reply = client.complete(&messages()).await.expect("completion failed");
    assert_eq!(reply, "hola");
}

#[tokio::test]
async fn test_content_is_returned_unprocessed() {
    let mock_server = MockServer::start().await;
    let content = "Aquí va:\n```json\n{\"calificacion_total\": 3}\n```";

    Mock::given(method("POST"))
        .respond_with(completion(content))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    assert_eq!(client.complete(&messages()).await.unwrap(), content);
}

#[tokio::test]
async fn test_server_error_is_connection_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    match client.complete(&messages()).await {
        Err(GradingError::Connection(message)) => assert!(message.contains("500")),
        other => panic!("expected connection error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_choices_is_unexpected_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "no model loaded"})))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    assert!(matches!(
        client.complete(&messages()).await,
        Err(GradingError::UnexpectedResponseShape(_))
    ));
}

#[tokio::test]
async fn test_non_json_body_is_unexpected_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    assert!(matches!(
        client.complete(&messages()).await,
        Err(GradingError::UnexpectedResponseShape(_))
    ));
}

#[tokio::test]
async fn test_slow_server_times_out_as_connection_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(completion("{}").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = LmStudioConfig::new(mock_server.uri(), "test-model")
        .with_timeout(Duration::from_millis(200));
    let client = ChatCompletionClient::new(config).unwrap();

    assert!(matches!(
        client.complete(&messages()).await,
        Err(GradingError::Connection(_))
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_fails_evaluation() {
    let config = LmStudioConfig::new("http://127.0.0.1:1", "test-model")
        .with_timeout(Duration::from_secs(5));
    let client = ChatCompletionClient::new(config).unwrap();
    let evaluator = Evaluator::new(client, PromptVariant::Nested);

    let outcome = evaluator
        .evaluate(&EvaluationRequest::new("texto", "resumen"))
        .await;

    let failure = outcome.failure().expect("expected failure");
    assert_eq!(failure.kind, FailureKind::ConnectionError);
    assert!(failure.raw_reply.is_none());
}

#[tokio::test]
async fn test_fenced_nested_reply_is_graded_end_to_end() {
    let mock_server = MockServer::start().await;
    let content = "```json\n{\"calificacion_total\": 20, \"calificaciones_criterios\": \
        {\"estructura\": 4, \"ortografia\": 5, \"comprension\": 4, \"redaccion\": 3, \"sintesis\": 4}, \
        \"retroalimentacion_general\": \"Buen trabajo\"}\n```";

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(content))
        .mount(&mock_server)
        .await;

    let evaluator = Evaluator::new(create_test_client(&mock_server), PromptVariant::Nested);
    let outcome = evaluator
        .evaluate(&EvaluationRequest::new("texto", "resumen"))
        .await;

    match outcome {
        EvaluationOutcome::Graded { result, .. } => {
            assert_eq!(result.total_score, 20);
            assert_eq!(result.scores.get(Criterion::Spelling), 5);
            assert_eq!(result.scores.get(Criterion::Writing), 3);
            assert_eq!(result.general_feedback, "Buen trabajo");
        }
        other => panic!("expected graded outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_truncated_reply_is_malformed_json() {
    let mock_server = MockServer::start().await;
    let content = "{\"calificacion_total\": 12, \"nota_estructura\": }";

    Mock::given(method("POST"))
        .respond_with(completion(content))
        .mount(&mock_server)
        .await;

    let evaluator = Evaluator::new(create_test_client(&mock_server), PromptVariant::Flat);
    let outcome = evaluator
        .evaluate(&EvaluationRequest::new("texto", "resumen"))
        .await;

    let failure = outcome.failure().expect("expected failure");
    assert_eq!(failure.kind, FailureKind::MalformedJson);
    assert_eq!(failure.raw_reply.as_deref(), Some(content));
}
