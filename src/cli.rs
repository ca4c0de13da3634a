//! CLI interface and command handling

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gemini CLI - chat with Gemini models from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(short, long, global = true, env = "GEMINI_DEBUG")]
    pub debug: bool,

    /// Logging level
    #[arg(long, global = true, value_enum, ignore_case = true, default_value_t = LogLevel::Warning)]
    pub logging_level: LogLevel,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GEMINI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// API key for this run (not saved)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API base URL for this run (not saved)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// JSON file with an array of tool descriptors to offer the model
    #[arg(long, global = true)]
    pub tools: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Initial message to send
        message: Option<String>,

        /// Enable multiline input mode
        #[arg(long)]
        multiline: bool,
    },

    /// Send a single query and get a response
    Query {
        /// The query to send
        message: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Configure the CLI
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Set API key
        #[arg(long = "set-api-key")]
        api_key: Option<String>,

        /// Set default model
        #[arg(long = "set-model")]
        model: Option<String>,

        /// Set system prompt
        #[arg(long)]
        system_prompt: Option<String>,

        /// Set base URL for API
        #[arg(long = "set-api-base")]
        api_base: Option<String>,
    },

    /// List available models
    Models,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Accepted values for `--logging-level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            // tracing has no level above error
            Self::Error | Self::Critical => "error",
        }
    }
}

impl Cli {
    /// Effective logging level, with `--debug` taking precedence
    pub fn log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            self.logging_level
        }
    }
}
