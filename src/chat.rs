//! Interactive chat loop

use crate::api::{Message, Role, ToolDescriptor};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::session::Session;
use crate::ui;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

/// Slash commands (plus bare `exit`/`quit`) understood by the chat loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Exit,
    Help,
    Clear,
    History,
    Tools,
    /// Forget the conversation, both locally and in the chat session
    Reset,
    Save(Option<PathBuf>),
    Unknown(String),
}

/// One line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Empty,
    Command(ChatCommand),
    Message(String),
}

/// Classify a line of user input
pub fn parse_input(line: &str) -> ChatInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChatInput::Empty;
    }

    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return ChatInput::Command(ChatCommand::Exit);
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatInput::Message(trimmed.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (command, None),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "exit" | "quit" => ChatCommand::Exit,
        "help" | "?" => ChatCommand::Help,
        "clear" | "cls" => ChatCommand::Clear,
        "history" => ChatCommand::History,
        "tools" => ChatCommand::Tools,
        "reset" => ChatCommand::Reset,
        "save" => ChatCommand::Save(arg.map(PathBuf::from)),
        _ => ChatCommand::Unknown(trimmed.to_string()),
    };
    ChatInput::Command(command)
}

/// Options for [`run`]
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Sent before the first prompt is shown
    pub initial_message: Option<String>,
    /// Read each turn from `$EDITOR` instead of a single line
    pub multiline: bool,
}

/// Run the read-eval-print loop until the user exits or input closes
pub async fn run(
    client: &mut GeminiClient,
    session: &mut Session,
    tools: &[ToolDescriptor],
    options: ChatOptions,
) -> Result<()> {
    ui::show_welcome(client.model(), tools.len());

    let mut pending = options.initial_message;
    loop {
        let line = match pending.take() {
            Some(line) => line,
            None => {
                let read = if options.multiline {
                    ui::get_multiline_input()
                } else {
                    ui::get_input("You")
                };
                match read {
                    Ok(line) => line,
                    Err(e) => {
                        debug!("Input closed: {e}");
                        ui::display_notice("Input closed - exiting chat.");
                        break;
                    }
                }
            }
        };

        match parse_input(&line) {
            ChatInput::Empty => {}
            ChatInput::Command(ChatCommand::Exit) => {
                ui::display_notice("Exiting chat mode.");
                break;
            }
            ChatInput::Command(command) => handle_command(command, client, session, tools).await,
            ChatInput::Message(text) => send_turn(client, session, tools, text).await,
        }
    }

    Ok(())
}

async fn send_turn(
    client: &mut GeminiClient,
    session: &mut Session,
    tools: &[ToolDescriptor],
    text: String,
) {
    session.add_message(Message::user(text));

    let spinner = ui::create_spinner("Thinking...");
    let outcome = tokio::select! {
        result = client.create_completion(session.history(), tools) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    spinner.finish_and_clear();

    match outcome {
        Some(Ok(completion)) => {
            ui::display_completion(&completion, OutputFormat::Text);
            session.record_completion(&completion);
        }
        Some(Err(e)) => ui::display_error(&e.to_string()),
        None => ui::display_notice("Interrupted - type 'exit' to quit."),
    }
}

async fn handle_command(
    command: ChatCommand,
    client: &mut GeminiClient,
    session: &mut Session,
    tools: &[ToolDescriptor],
) {
    match command {
        ChatCommand::Exit => {}
        ChatCommand::Help => ui::show_help(),
        ChatCommand::Clear => ui::clear_screen(),
        ChatCommand::History => show_history(session),
        ChatCommand::Tools => show_tools(tools),
        ChatCommand::Reset => {
            session.clear();
            client.reset_chat();
            ui::display_notice("Conversation reset.");
        }
        ChatCommand::Save(path) => match session.save(path).await {
            Ok(path) => println!("{} {}", "Saved to".green(), path.display()),
            Err(e) => ui::display_error(&e.to_string()),
        },
        ChatCommand::Unknown(input) => {
            ui::display_notice(&format!("Unknown command: {input}. Type /help for commands."));
        }
    }
}

fn show_history(session: &Session) {
    for message in session.history() {
        let label = match message.role {
            Role::System => "System".dimmed(),
            Role::User => "You".cyan().bold(),
            Role::Assistant => "Assistant".green().bold(),
        };
        println!("{label}");
        println!("{}", ui::wrap_text(&message.content));
        println!();
    }
}

fn show_tools(tools: &[ToolDescriptor]) {
    if tools.is_empty() {
        ui::display_notice("No tools loaded. Pass --tools <file.json> to offer some.");
        return;
    }
    for tool in tools {
        let name = tool.name().unwrap_or("<unnamed>");
        if tool.is_function() {
            println!("  {}", name.cyan());
        } else {
            println!("  {} {}", name.dimmed(), format!("(unsupported type: {})", tool.kind).dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_input(""), ChatInput::Empty);
        assert_eq!(parse_input("   \n"), ChatInput::Empty);
    }

    #[test]
    fn exit_words_end_the_chat() {
        for line in ["exit", "QUIT", " quit ", "/exit", "/quit"] {
            assert_eq!(parse_input(line), ChatInput::Command(ChatCommand::Exit), "{line}");
        }
    }

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            parse_input("  What's the weather in Paris? "),
            ChatInput::Message("What's the weather in Paris?".to_string())
        );
        assert_eq!(
            parse_input("exit strategy?"),
            ChatInput::Message("exit strategy?".to_string())
        );
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse_input("/help"), ChatInput::Command(ChatCommand::Help));
        assert_eq!(parse_input("/HISTORY"), ChatInput::Command(ChatCommand::History));
        assert_eq!(parse_input("/tools"), ChatInput::Command(ChatCommand::Tools));
        assert_eq!(parse_input("/reset"), ChatInput::Command(ChatCommand::Reset));
        assert_eq!(parse_input("/save"), ChatInput::Command(ChatCommand::Save(None)));
        assert_eq!(
            parse_input("/save  out/chat.json "),
            ChatInput::Command(ChatCommand::Save(Some(PathBuf::from("out/chat.json"))))
        );
        assert_eq!(
            parse_input("/frobnicate now"),
            ChatInput::Command(ChatCommand::Unknown("/frobnicate now".to_string()))
        );
    }
}
