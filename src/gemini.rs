//! Gemini API client and response adapter
//!
//! [`GeminiClient::create_completion`] sends the newest user turn to a
//! Gemini chat session and maps the first candidate back into a
//! [`CompletionResult`].

use crate::api::{CompletionResult, FunctionCall, Message, ToolCall, ToolDescriptor};
use crate::arguments::{normalize_arguments, RawArguments};
use crate::config::Config;
use crate::error::{ProviderError, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::iter;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// One turn of a Gemini conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn holding a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// A role-less content block, as used for system instructions
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

/// A piece of a turn: text, a function call, or something we pass through untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallPart>,

    /// Fields such as `thoughtSignature` that must be echoed back in history
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Part {
    /// A plain text part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Function call payload as Gemini encodes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// A Gemini tool entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    pub function_declarations: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<&'a Content>,
    system_instruction: Content,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Conversation turns already accepted by the model.
///
/// Append-only: a turn pair is recorded only after a successful reply.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    history: Vec<Content>,
}

impl ChatSession {
    /// Turns sent and received so far
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Number of recorded turns
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether nothing has been exchanged yet
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Forget all turns
    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn record(&mut self, user: Content, reply: Content) {
        self.history.push(user);
        self.history.push(reply);
    }
}

/// Gemini API client holding one chat session
pub struct GeminiClient {
    client: Client,
    config: Config,
    api_key: String,
    chat: ChatSession,
}

impl GeminiClient {
    /// Create a new client bound to `config.model`.
    ///
    /// Fails with [`AppError::ApiKeyNotFound`](crate::AppError::ApiKeyNotFound)
    /// when no key is configured and the key environment variable is unset.
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config.api_key()?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ProviderError::from)?;

        Ok(Self {
            client,
            config,
            api_key,
            chat: ChatSession::default(),
        })
    }

    /// Model this client talks to
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// The chat session reused across calls
    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// Start over with an empty chat session
    pub fn reset_chat(&mut self) {
        self.chat.clear();
    }

    /// Send the last message of `messages` as a new turn.
    ///
    /// `messages[0]` is used as the system instruction. Earlier turns are not
    /// resent from `messages`; the chat session already holds them.
    #[instrument(skip_all, fields(model = %self.config.model))]
    pub async fn create_completion(
        &mut self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> std::result::Result<CompletionResult, ProviderError> {
        self.send_turn(messages, tools).await.map_err(|e| {
            error!("{e}");
            e
        })
    }

    async fn send_turn(
        &mut self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> std::result::Result<CompletionResult, ProviderError> {
        let (Some(system), Some(last)) = (messages.first(), messages.last()) else {
            return Err(ProviderError::EmptyConversation);
        };

        let tools = function_declarations(tools);
        let declared = serde_json::to_string(&tools)?;
        info!(tools = %declared, "Request config");

        let user_turn = Content::user(last.content.as_str());
        let response = {
            let request = GenerateContentRequest {
                contents: self.chat.history.iter().chain(iter::once(&user_turn)).collect(),
                system_instruction: Content::instruction(system.content.as_str()),
                tools,
            };

            let url = self.config.generate_content_url();
            debug!(%url, turns = request.contents.len(), "Sending generateContent request");

            self.client
                .post(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .json(&request)
                .send()
                .await?
        };

        let body: GenerateContentResponse = parse_body(response).await?;

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or(ProviderError::NoCandidates)?;
        let content = match candidate.content {
            Some(content) if !content.parts.is_empty() => content,
            _ => {
                return Err(ProviderError::EmptyCandidate {
                    finish_reason: candidate.finish_reason,
                })
            }
        };

        info!(part = ?content.parts[0], "Relevant response");
        let result = completion_from_part(&content.parts[0]);
        if !result.tool_calls.is_empty() {
            info!(tool_calls = ?result.tool_calls, "Final tool calls");
        }

        self.chat.record(user_turn, content);
        Ok(result)
    }

    /// List models available to this key, without the `models/` prefix
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = self.config.models_url();

        debug!("Fetching models from {}", url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        #[derive(Deserialize)]
        struct ModelsResponse {
            #[serde(default)]
            models: Vec<ModelInfo>,
        }

        #[derive(Deserialize)]
        struct ModelInfo {
            name: String,
        }

        let models: ModelsResponse = parse_body(response).await?;
        Ok(models
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

/// Read a JSON body, turning non-2xx statuses into [`ProviderError::Api`]
async fn parse_body<T: DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, ProviderError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&text)?)
}

/// Keep only function tools, one Gemini tool per declaration, in order
pub fn function_declarations(tools: &[ToolDescriptor]) -> Vec<GeminiTool> {
    tools
        .iter()
        .filter_map(|tool| {
            if !tool.is_function() {
                warn!("Unsupported tool type: {}", tool.kind);
                return None;
            }
            let Some(function) = &tool.function else {
                warn!("Function tool without a function schema");
                return None;
            };
            Some(GeminiTool {
                function_declarations: vec![function.clone()],
            })
        })
        .collect()
}

/// Map a response part into the uniform completion shape
pub fn completion_from_part(part: &Part) -> CompletionResult {
    let tool_calls = part
        .function_call
        .as_ref()
        .map(|call| ToolCall {
            id: call
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_call_id),
            function: FunctionCall {
                name: call.name.clone(),
                arguments: normalize_arguments(RawArguments::from(call.args.clone())),
            },
        })
        .into_iter()
        .collect();

    CompletionResult {
        response: part.text.clone().unwrap_or_default(),
        tool_calls,
    }
}

/// A fresh `call_` id with 8 hex characters
pub fn generate_call_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("call_{}", &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn part(value: Value) -> Part {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn filters_non_function_tools_in_order() {
        let tools = vec![
            ToolDescriptor::function(json!({"name": "a"})),
            ToolDescriptor {
                kind: "code_interpreter".to_string(),
                function: None,
            },
            ToolDescriptor::function(json!({"name": "b"})),
            ToolDescriptor {
                kind: "retrieval".to_string(),
                function: Some(json!({"name": "c"})),
            },
        ];

        let declared = function_declarations(&tools);
        let names: Vec<_> = declared
            .iter()
            .map(|t| t.function_declarations[0]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(declared.iter().all(|t| t.function_declarations.len() == 1));
    }

    #[test]
    fn tool_serializes_as_function_declarations() {
        let declared = function_declarations(&[ToolDescriptor::function(
            json!({"name": "get_weather", "parameters": {"type": "object"}}),
        )]);
        assert_eq!(
            serde_json::to_value(&declared).unwrap(),
            json!([{"functionDeclarations": [{"name": "get_weather", "parameters": {"type": "object"}}]}])
        );
    }

    #[test]
    fn text_part_has_no_tool_calls() {
        let result = completion_from_part(&part(json!({"text": "Hello there"})));
        assert_eq!(result.response, "Hello there");
        assert!(result.tool_calls.is_empty());
    }

    #[test]
    fn function_call_keeps_upstream_id() {
        let result = completion_from_part(&part(json!({
            "functionCall": {"id": "abc", "name": "get_weather", "args": {"location": "Paris"}}
        })));
        assert_eq!(result.response, "");
        assert_eq!(
            result.tool_calls,
            vec![ToolCall {
                id: "abc".to_string(),
                function: FunctionCall {
                    name: "get_weather".to_string(),
                    arguments: r#"{"location": "Paris"}"#.to_string(),
                },
            }]
        );
    }

    #[test]
    fn function_call_without_args_gets_empty_object() {
        let result = completion_from_part(&part(json!({"functionCall": {"name": "now"}})));
        assert_eq!(result.tool_calls[0].function.arguments, "{}");
    }

    #[test]
    fn generated_ids_are_call_plus_eight_hex() {
        let a = generate_call_id();
        let b = generate_call_id();
        for id in [&a, &b] {
            let hex = id.strip_prefix("call_").unwrap();
            assert_eq!(hex.len(), 8);
            assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_part_fields_survive_round_trip() {
        let raw = json!({"text": "hi", "thoughtSignature": "sig"});
        let parsed = part(raw.clone());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }
}
