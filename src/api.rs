//! Provider-independent conversation and completion types

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A caller-supplied tool, in the OpenAI-style `{type, function}` shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    #[serde(rename = "type")]
    pub kind: String,

    /// Function schema: `name`, `description`, `parameters`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<Value>,
}

impl ToolDescriptor {
    /// Create a function tool from its schema
    pub fn function(function: Value) -> Self {
        Self {
            kind: "function".to_string(),
            function: Some(function),
        }
    }

    /// Whether this descriptor can be forwarded to the model
    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }

    /// Name of the described function, if any
    pub fn name(&self) -> Option<&str> {
        self.function.as_ref()?.get("name")?.as_str()
    }
}

/// Read a JSON array of tool descriptors from disk
pub async fn load_tools(path: &Path) -> Result<Vec<ToolDescriptor>> {
    let json = tokio::fs::read_to_string(path).await?;
    let tools = serde_json::from_str(&json)?;
    Ok(tools)
}

/// A function invocation requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Always a JSON object encoded as a string
    pub arguments: String,
}

/// A tool call in the uniform output shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: FunctionCall,
}

/// The normalized reply handed back to the CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
}
