//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat_list;
pub mod model_list;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::cli::chat_list::{delete_conversation, list_conversations, show_conversation};
use crate::cli::model_list::list_models;
use crate::core::config::data::path_display;
use crate::core::config::Config;
use crate::core::manager::ConversationManager;
use crate::core::session::SessionContext;
use crate::core::store::{FileStore, KeyValueStore, MemoryStore};
use crate::ui::chat_loop::{load_models, run_chat, ChatOptions};
use crate::ui::theme::Theme;
use crate::utils::logging::init_tracing;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("VERGEN_GIT_DESCRIBE"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ")\nbuilt: ",
    env!("VERGEN_BUILD_DATE"),
);

#[derive(Parser, Debug)]
#[command(name = "ollama-chat", version, long_version = LONG_VERSION)]
#[command(about = "A terminal chat client for local Ollama-compatible model servers")]
#[command(
    long_about = "ollama-chat talks to a local model server (Ollama by default) and streams \
replies into your terminal. Conversations are saved automatically and can be reopened later.\n\n\
Environment Variables:\n\
  OLLAMA_CHAT_BASE_URL   Server URL (defaults to http://localhost:11434)\n\
  OLLAMA_CHAT_LOG        Log filter, e.g. debug or ollama_chat=trace (off unless set; warn with --log)\n\n\
Chat commands:\n\
  /new [title]      Start a new conversation\n\
  /list             List saved conversations\n\
  /open <id>        Switch to a saved conversation\n\
  /delete <id>      Delete a saved conversation\n\
  /rename <title>   Rename the current conversation\n\
  /model [name]     Show or switch the model\n\
  /models           Refresh the model list\n\
  /help             Show commands\n\
  /quit             Leave (Ctrl+D works too)\n\n\
Ctrl+C stops a reply in progress."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use when the server offers it
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Model server URL, overriding the config file and environment
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Use colours suited to light terminal backgrounds
    #[arg(long, global = true)]
    pub light: bool,

    /// Disable syntax highlighting of code blocks
    #[arg(long, global = true)]
    pub no_syntax: bool,

    /// Chat without reading or saving conversations
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List models served by the backend
    Models,
    /// List saved conversations
    List,
    /// Print a saved conversation
    Show {
        /// Conversation id, as shown by `list`
        id: String,
    },
    /// Delete a saved conversation
    Delete {
        /// Conversation id, as shown by `list`
        id: String,
    },
    /// Show the active configuration
    Config {
        /// Write a config file with default values if none exists yet
        #[arg(long)]
        init: bool,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    init_tracing(args.log.as_deref())?;

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_overrides(args.base_url.clone());
    debug!(base_url = %config.api.base_url, "Configuration loaded");

    let theme = if args.light {
        Theme::light()
    } else {
        Theme::for_config(config.is_light_theme())
    };
    let syntax = config.ui.syntax && !args.no_syntax;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let options = ChatOptions {
                theme,
                syntax,
                preferred_model: preferred_model(args.model.as_deref(), &config),
            };
            if args.ephemeral {
                let manager = ConversationManager::load(MemoryStore::new(), &config);
                start_chat(manager, &config, options).await
            } else {
                start_chat(open_manager(&config)?, &config, options).await
            }
        }
        Commands::Models => list_models(&config).await,
        Commands::List => {
            let manager = open_manager(&config)?;
            list_conversations(&manager, &mut std::io::stdout())
        }
        Commands::Show { id } => {
            let manager = open_manager(&config)?;
            show_conversation(&manager, &id, &theme, syntax, &mut std::io::stdout())
        }
        Commands::Delete { id } => {
            let mut manager = open_manager(&config)?;
            delete_conversation(&mut manager, &id, &mut std::io::stdout())
        }
        Commands::Config { init } => {
            let path = match &args.config {
                Some(path) => path.clone(),
                None => Config::get_config_path()?,
            };
            if init {
                if path.exists() {
                    println!("Config already exists at {}", path_display(&path));
                } else {
                    Config::default().save_to_path(&path)?;
                    println!("✅ Wrote default config to {}", path_display(&path));
                }
            } else {
                println!("Config file: {}", path_display(&path));
            }
            config.print_all();
            Ok(())
        }
    }
}

async fn start_chat<S: KeyValueStore>(
    mut manager: ConversationManager<S>,
    config: &Config,
    options: ChatOptions,
) -> Result<(), Box<dyn Error>> {
    let session = SessionContext::from_config(config)?;
    let preferred = options.preferred_model.as_deref();
    // A failure is logged; the banner then shows that no model is selected.
    let _ = load_models(&mut manager, &session, preferred).await;
    run_chat(manager, session, options).await
}

fn open_manager(config: &Config) -> Result<ConversationManager<FileStore>, Box<dyn Error>> {
    let data_dir = config
        .data_dir()
        .ok_or("Could not determine a data directory; set storage.data_dir in the config")?;
    debug!(data_dir = %path_display(&data_dir), "Opening conversation store");
    Ok(ConversationManager::load(FileStore::new(data_dir), config))
}

/// `--model` wins over the configured default.
fn preferred_model(cli_model: Option<&str>, config: &Config) -> Option<String> {
    cli_model
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let default = config.ui.default_model.trim();
            (!default.is_empty()).then(|| default.to_string())
        })
}
