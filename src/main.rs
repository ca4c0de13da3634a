use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use gemini_cli::api::{load_tools, ToolDescriptor};
use gemini_cli::chat::{self, ChatOptions};
use gemini_cli::cli::{Cli, Commands, OutputFormat};
use gemini_cli::config::Config;
use gemini_cli::session::Session;
use gemini_cli::{logging, ui, GeminiClient, Message};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.log_level());

    let file_config = Config::load_file(cli.config.as_deref()).await?;

    let mut config = file_config.clone();
    config.apply_env();
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = Some(api_key);
    }
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }

    let tools: Vec<ToolDescriptor> = match &cli.tools {
        Some(path) => load_tools(path)
            .await
            .with_context(|| format!("Failed to load tools from {}", path.display()))?,
        None => Vec::new(),
    };

    let command = cli.command.unwrap_or(Commands::Chat {
        message: None,
        multiline: false,
    });

    match command {
        Commands::Chat { message, multiline } => {
            let mut session = Session::new(config.model.as_str(), config.system_prompt.as_str());
            let mut client = GeminiClient::new(config)?;
            let options = ChatOptions {
                initial_message: message,
                multiline,
            };
            chat::run(&mut client, &mut session, &tools, options).await?;
        }
        Commands::Query { message, format } => {
            let messages = [
                Message::system(config.system_prompt.as_str()),
                Message::user(message),
            ];
            let mut client = GeminiClient::new(config)?;

            let spinner = (format == OutputFormat::Text).then(|| ui::create_spinner("Thinking..."));
            let result = client.create_completion(&messages, &tools).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            ui::display_completion(&result?, format);
        }
        Commands::Models => {
            let client = GeminiClient::new(config)?;
            let spinner = ui::create_spinner("Fetching models...");
            let models = client.list_models().await;
            spinner.finish_and_clear();

            for model in models? {
                println!("  {model}");
            }
        }
        // edits what is on disk, so the per-run overrides are left out
        Commands::Config {
            show,
            api_key,
            model,
            system_prompt,
            api_base,
        } => {
            let updates = ConfigUpdates {
                api_key,
                model,
                system_prompt,
                api_base,
            };
            configure(file_config, cli.config.as_deref(), show, updates).await?;
        }
    }

    Ok(())
}

struct ConfigUpdates {
    api_key: Option<String>,
    model: Option<String>,
    system_prompt: Option<String>,
    api_base: Option<String>,
}

async fn configure(
    mut config: Config,
    path: Option<&Path>,
    show: bool,
    updates: ConfigUpdates,
) -> Result<()> {
    let mut changed = false;
    if let Some(api_key) = updates.api_key {
        config.api_key = Some(api_key);
        changed = true;
    }
    if let Some(model) = updates.model {
        config.model = model;
        changed = true;
    }
    if let Some(system_prompt) = updates.system_prompt {
        config.system_prompt = system_prompt;
        changed = true;
    }
    if let Some(api_base) = updates.api_base {
        config.api_base = api_base;
        changed = true;
    }

    if changed {
        let saved_to = match path {
            Some(path) => {
                config.save_to(path).await?;
                path.to_path_buf()
            }
            None => config.save().await?,
        };
        println!("{} {}", "Configuration saved to".green(), saved_to.display());
    }

    if show || !changed {
        show_config(&config);
    }

    Ok(())
}

fn show_config(config: &Config) {
    let api_key = config
        .masked_api_key()
        .unwrap_or_else(|| format!("(not set, checked ${})", config.api_key_env));
    let timeout = config
        .timeout_seconds
        .map_or_else(|| "none".to_string(), |secs| format!("{secs}s"));

    println!("{}", "Current Configuration:".yellow().bold());
    println!("  {}: {}", "API key".cyan(), api_key);
    println!("  {}: {}", "Model".cyan(), config.model);
    println!("  {}: {}", "API base".cyan(), config.api_base);
    println!("  {}: {}", "API version".cyan(), config.api_version);
    println!("  {}: {}", "Timeout".cyan(), timeout);
    println!("  {}: {}", "System prompt".cyan(), config.system_prompt);
}
