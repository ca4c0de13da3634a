//! Gemini CLI Library - chat with Gemini and get tool calls in a uniform shape

pub mod api;
pub mod arguments;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logging;
pub mod session;
pub mod ui;

pub use api::{CompletionResult, FunctionCall, Message, Role, ToolCall, ToolDescriptor};
pub use error::{AppError, ProviderError, Result};
pub use gemini::GeminiClient;
