//! Integration tests for the Gemini adapter

use gemini_cli::config::Config;
use gemini_cli::{AppError, GeminiClient, Message, ProviderError, ToolDescriptor};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

/// Helper function to create a test config pointing to mock server
fn create_test_config(mock_server: &MockServer) -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        api_key_env: "GEMINI_CLI_TEST_KEY_UNUSED".to_string(),
        model: "gemini-test".to_string(),
        api_base: mock_server.uri(),
        timeout_seconds: Some(5),
        ..Config::default()
    }
}

fn reply_with_part(part: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [part]},
            "finishReason": "STOP"
        }]
    }))
}

fn weather_tool() -> ToolDescriptor {
    ToolDescriptor::function(json!({
        "name": "get_weather",
        "description": "Current weather for a city",
        "parameters": {
            "type": "object",
            "properties": {"location": {"type": "string"}},
            "required": ["location"]
        }
    }))
}

fn paris_messages() -> Vec<Message> {
    vec![
        Message::system("You are helpful"),
        Message::user("What's the weather in Paris?"),
    ]
}

async fn request_bodies(mock_server: &MockServer) -> Vec<Value> {
    mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

fn assert_call_id(id: &str) {
    let hex = id
        .strip_prefix("call_")
        .unwrap_or_else(|| panic!("id without call_ prefix: {id}"));
    assert_eq!(hex.len(), 8, "{id}");
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()), "{id}");
}

#[tokio::test]
async fn test_weather_tool_call_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(reply_with_part(json!({
            "text": "Let me check.",
            "functionCall": {"name": "get_weather", "args": "{\"location\":\"Paris\"}"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let result = client
        .create_completion(&paris_messages(), &[weather_tool()])
        .await
        .unwrap();

    assert_eq!(result.response, "Let me check.");
    assert_eq!(result.tool_calls.len(), 1);
    let call = &result.tool_calls[0];
    assert_call_id(&call.id);
    assert_eq!(call.function.name, "get_weather");
    assert_eq!(call.function.arguments, r#"{"location": "Paris"}"#);
}

#[tokio::test]
async fn test_request_carries_system_instruction_last_turn_and_tools() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply_with_part(json!({"text": "ok"})))
        .mount(&mock_server)
        .await;

    let messages = vec![
        Message::system("You are helpful"),
        Message::user("first question"),
        Message::assistant("first answer"),
        Message::user("second question"),
    ];
    let tools = vec![
        weather_tool(),
        ToolDescriptor {
            kind: "retrieval".to_string(),
            function: None,
        },
        ToolDescriptor::function(json!({"name": "get_time", "parameters": {"type": "object"}})),
    ];

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    client.create_completion(&messages, &tools).await.unwrap();

    let bodies = request_bodies(&mock_server).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];

    assert_eq!(
        body["systemInstruction"],
        json!({"parts": [{"text": "You are helpful"}]})
    );
    assert_eq!(
        body["contents"],
        json!([{"role": "user", "parts": [{"text": "second question"}]}])
    );

    let names: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["functionDeclarations"][0]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["get_weather", "get_time"]);
}

#[tokio::test]
async fn test_chat_session_resends_accepted_turns() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply_with_part(json!({"text": "Hi Ada!"})))
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();

    let mut messages = vec![Message::system("sys"), Message::user("I am Ada")];
    client.create_completion(&messages, &[]).await.unwrap();
    messages.push(Message::assistant("Hi Ada!"));
    messages.push(Message::user("What is my name?"));
    client.create_completion(&messages, &[]).await.unwrap();

    assert_eq!(client.chat().len(), 4);

    let bodies = request_bodies(&mock_server).await;
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].get("tools").is_none());
    assert_eq!(
        bodies[1]["contents"],
        json!([
            {"role": "user", "parts": [{"text": "I am Ada"}]},
            {"role": "model", "parts": [{"text": "Hi Ada!"}]},
            {"role": "user", "parts": [{"text": "What is my name?"}]}
        ])
    );

    client.reset_chat();
    assert!(client.chat().is_empty());
}

#[tokio::test]
async fn test_text_reply_has_empty_tool_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply_with_part(json!({"text": "Hello! How can I help you today?"})))
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let result = client
        .create_completion(&paris_messages(), &[])
        .await
        .unwrap();

    assert_eq!(result.response, "Hello! How can I help you today?");
    assert!(result.tool_calls.is_empty());
}

#[tokio::test]
async fn test_malformed_arguments_fall_back_to_empty_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply_with_part(json!({
            "functionCall": {"id": "fc-1", "name": "get_weather", "args": "{invalid"}
        })))
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let result = client
        .create_completion(&paris_messages(), &[weather_tool()])
        .await
        .unwrap();

    assert_eq!(result.response, "");
    assert_eq!(result.tool_calls[0].id, "fc-1");
    assert_eq!(result.tool_calls[0].function.arguments, "{}");
}

#[tokio::test]
async fn test_object_arguments_are_serialized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply_with_part(json!({
            "functionCall": {"name": "get_weather", "args": {"location": "Paris", "unit": "celsius"}}
        })))
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let result = client
        .create_completion(&paris_messages(), &[weather_tool()])
        .await
        .unwrap();

    assert_call_id(&result.tool_calls[0].id);
    assert_eq!(
        result.tool_calls[0].function.arguments,
        r#"{"location": "Paris", "unit": "celsius"}"#
    );
}

#[tokio::test]
async fn test_api_error_is_provider_error() {
    let mock_server = MockServer::start().await;

    let error_response = json!({
        "error": {
            "code": 400,
            "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT"
        }
    });

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_response))
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let error = client
        .create_completion(&paris_messages(), &[])
        .await
        .unwrap_err();

    match &error {
        ProviderError::Api { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "API key not valid. Please pass a valid API key.");
        }
        e => panic!("Expected Api error, got {e:?}"),
    }
    assert!(error.to_string().starts_with("Gemini API Error:"));
    assert!(client.chat().is_empty(), "failed turns must not be recorded");
}

#[tokio::test]
async fn test_unstructured_error_body_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let error = client
        .create_completion(&paris_messages(), &[])
        .await
        .unwrap_err();

    assert!(matches!(error, ProviderError::Api { status: 503, .. }));
    assert!(error.to_string().contains("upstream unavailable"));
}

#[tokio::test]
async fn test_empty_candidates_is_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let error = client
        .create_completion(&paris_messages(), &[])
        .await
        .unwrap_err();

    assert!(matches!(error, ProviderError::NoCandidates));
}

#[tokio::test]
async fn test_blocked_candidate_reports_finish_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"candidates": [{"finishReason": "SAFETY"}]})),
        )
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let error = client
        .create_completion(&paris_messages(), &[])
        .await
        .unwrap_err();

    assert!(error.to_string().contains("SAFETY"));
}

#[tokio::test]
async fn test_empty_conversation_is_rejected_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(reply_with_part(json!({"text": "unused"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let error = client.create_completion(&[], &[]).await.unwrap_err();

    assert!(matches!(error, ProviderError::EmptyConversation));
}

#[tokio::test]
async fn test_missing_api_key_fails_construction() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(reply_with_part(json!({"text": "unused"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = Config {
        api_key: None,
        api_key_env: "GEMINI_CLI_TEST_KEY_NEVER_SET".to_string(),
        ..create_test_config(&mock_server)
    };

    match GeminiClient::new(config) {
        Err(AppError::ApiKeyNotFound) => (),
        Err(e) => panic!("Expected ApiKeyNotFound, got {e:?}"),
        Ok(_) => panic!("Expected ApiKeyNotFound, got a client"),
    }
}

#[tokio::test]
async fn test_api_key_from_environment() {
    std::env::set_var("GEMINI_CLI_TEST_KEY_FROM_ENV", "env-key");

    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "env-key"))
        .respond_with(reply_with_part(json!({"text": "authorized"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        api_key: None,
        api_key_env: "GEMINI_CLI_TEST_KEY_FROM_ENV".to_string(),
        ..create_test_config(&mock_server)
    };

    let mut client = GeminiClient::new(config).unwrap();
    let result = client.create_completion(&paris_messages(), &[]).await.unwrap();
    assert_eq!(result.response, "authorized");

    std::env::remove_var("GEMINI_CLI_TEST_KEY_FROM_ENV");
}

#[tokio::test]
async fn test_list_models_strips_prefix() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "models/gemini-2.5-flash", "displayName": "Gemini 2.5 Flash"},
                {"name": "models/gemini-2.5-pro"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = GeminiClient::new(create_test_config(&mock_server)).unwrap();
    let models = client.list_models().await.unwrap();

    assert_eq!(models, vec!["gemini-2.5-flash", "gemini-2.5-pro"]);
}
