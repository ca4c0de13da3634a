//! Error types for the Gemini CLI application

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    /// No credential could be resolved when building the client
    #[error("API key not found. Please set the GEMINI_API_KEY environment variable")]
    ApiKeyNotFound,

    #[error("Failed to read configuration: {0}")]
    ConfigError(String),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Failure talking to Gemini or interpreting its reply.
///
/// Every variant renders with the same `Gemini API Error:` prefix so callers
/// see one uniform error while still being able to match on the cause.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("Gemini API Error: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("Gemini API Error: {message} (status {status})")]
    Api { status: u16, message: String },

    /// Response body was not the expected shape
    #[error("Gemini API Error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gemini API Error: no messages to send")]
    EmptyConversation,

    #[error("Gemini API Error: response contained no candidates")]
    NoCandidates,

    /// First candidate carried no content parts, e.g. blocked by a safety filter
    #[error("Gemini API Error: candidate has no content (finish reason: {})", .finish_reason.as_deref().unwrap_or("unknown"))]
    EmptyCandidate { finish_reason: Option<String> },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;
