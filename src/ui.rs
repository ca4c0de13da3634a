//! User interface components and interactions

use crate::api::{CompletionResult, ToolCall};
use crate::cli::OutputFormat;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Editor, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use tabled::{
    builder::Builder,
    settings::{Style, Width},
};
use textwrap::{wrap, Options};

/// Display a welcome message
pub fn show_welcome(model: &str, tool_count: usize) {
    println!("{}", "╔══════════════════════════════════════╗".cyan());
    println!(
        "{}",
        "║       Gemini CLI - Chat Mode         ║".cyan().bold()
    );
    println!("{}", "╚══════════════════════════════════════╝".cyan());
    println!();
    println!("{} {}", "Model:".dimmed(), model);
    println!("{} {}", "Tools:".dimmed(), tool_count);
    println!();
    println!("{}", "Type 'exit' or 'quit' to end the session".dimmed());
    println!("{}", "Type '/help' for more commands".dimmed());
    println!();
}

/// Get user input with a prompt
pub fn get_input(prompt: &str) -> io::Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(io::Error::other)
}

/// Get multiline input
pub fn get_multiline_input() -> io::Result<String> {
    println!(
        "{}",
        "Enter your message (save and close the editor when done):".dimmed()
    );
    Editor::new()
        .edit("")
        .map(Option::unwrap_or_default)
        .map_err(io::Error::other)
}

/// Get terminal width for proper text wrapping with margins
fn get_terminal_width() -> usize {
    let full_width = terminal_size::terminal_size()
        .map(|(width, _)| width.0 as usize)
        .unwrap_or(80);

    // 4 chars of margin on each side
    let margin = 8;
    if full_width > margin {
        full_width - margin
    } else {
        full_width.saturating_sub(4)
    }
}

/// Wrap text to fit terminal width with margins
pub fn wrap_text(text: &str) -> String {
    wrap_text_to(text, get_terminal_width())
}

/// Wrap text to `width` columns with a two-space left margin
pub fn wrap_text_to(text: &str, width: usize) -> String {
    let options = Options::new(width.max(1))
        .break_words(false)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);

    let left_margin = "  ";

    let lines: Vec<String> = text
        .lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                wrap(line, &options)
                    .into_iter()
                    .map(|cow| format!("{left_margin}{cow}"))
                    .collect::<Vec<_>>()
            }
        })
        .collect();

    lines.join("\n")
}

/// Render tool calls as a table
pub fn render_tool_calls(calls: &[ToolCall]) -> String {
    let mut builder = Builder::default();
    builder.push_record(vec![
        "ID".to_string(),
        "Function".to_string(),
        "Arguments".to_string(),
    ]);
    for call in calls {
        builder.push_record(vec![
            call.id.clone(),
            call.function.name.clone(),
            call.function.arguments.clone(),
        ]);
    }

    let mut table = builder.build();
    table
        .with(Style::modern())
        .with(Width::wrap(get_terminal_width()));
    table.to_string()
}

/// Display a completion in the requested format
pub fn display_completion(completion: &CompletionResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(completion) {
            Ok(json) => println!("{json}"),
            Err(e) => display_error(&e.to_string()),
        },
        OutputFormat::Text => {
            println!();
            println!("{}", "Assistant:".green().bold());
            println!();
            if !completion.response.is_empty() {
                println!("{}", wrap_text(&completion.response));
                println!();
            }
            if !completion.tool_calls.is_empty() {
                println!("{}", "Tool calls requested:".yellow().bold());
                println!("{}", render_tool_calls(&completion.tool_calls));
                println!();
            }
        }
    }
}

/// Display an error message
pub fn display_error(error: &str) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}

/// Display an informational notice
pub fn display_notice(message: &str) {
    println!("{}", message.yellow());
}

/// Create a spinner for loading states
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Clear the terminal screen
pub fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
    let _ = io::stdout().flush();
}

/// Chat commands and what they do, in display order
pub const CHAT_COMMANDS: &[(&str, &str)] = &[
    ("exit/quit", "End the chat session"),
    ("/help", "Show this help message"),
    ("/clear", "Clear the screen"),
    ("/history", "Show the conversation so far"),
    ("/tools", "List tools offered to the model"),
    ("/reset", "Forget the conversation and start over"),
    ("/save [path]", "Save the conversation as JSON"),
];

/// Display help information
pub fn show_help() {
    println!("{}", "Available Commands:".yellow().bold());
    for (command, description) in CHAT_COMMANDS {
        println!("  {:<14} - {}", command.cyan(), description);
    }
    println!();
}
