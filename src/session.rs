//! Local conversation transcript

use crate::api::{CompletionResult, Message, Role, ToolCall};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub model: String,
    /// Starts with the system message
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl Session {
    /// Create a new session seeded with a system prompt
    pub fn new(model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            model: model.into(),
            messages: vec![Message::system(system_prompt)],
            tool_calls: Vec::new(),
        }
    }

    /// Add a message to the session
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Record the assistant reply and any tool calls it requested
    pub fn record_completion(&mut self, completion: &CompletionResult) {
        self.messages.push(Message::assistant(completion.response.as_str()));
        self.tool_calls.extend(completion.tool_calls.iter().cloned());
    }

    /// Get the conversation history
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// Drop everything but the system message
    pub fn clear(&mut self) {
        self.messages.truncate(1);
        self.tool_calls.clear();
    }

    /// Save session to file
    pub async fn save(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        let path = path.unwrap_or_else(|| {
            let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push("gemini-cli");
            path.push("sessions");
            path.push(format!("{}.json", self.id));
            path
        });

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json).await?;

        Ok(path)
    }

    /// Load session from file
    pub async fn load(path: PathBuf) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        let session = serde_json::from_str(&json)?;
        Ok(session)
    }

    /// Export session as markdown
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("# Chat Session: {}\n", self.id));
        output.push_str(&format!(
            "**Date:** {}\n",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!("**Model:** {}\n\n", self.model));

        for message in &self.messages {
            let role = match message.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };

            output.push_str(&format!("## {}\n\n{}\n\n", role, message.content));
        }

        if !self.tool_calls.is_empty() {
            output.push_str("## Tool Calls\n\n");
            for call in &self.tool_calls {
                output.push_str(&format!(
                    "- `{}` {}({})\n",
                    call.id, call.function.name, call.function.arguments
                ));
            }
            output.push('\n');
        }

        output
    }
}
