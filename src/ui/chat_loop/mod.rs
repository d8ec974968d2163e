//! Interactive chat loop
//!
//! Reads prompts line by line, dispatches slash commands, and streams replies
//! to stdout. While a reply streams, further input stays buffered and Ctrl+C
//! stops the reply instead of the program.

mod printer;
mod setup;
mod stream;

pub use self::setup::load_models;
pub use self::stream::{run_exchange, ExchangeOutcome, StreamChannel};

use crate::commands::{process_input, CommandResult};
use crate::core::manager::ConversationManager;
use crate::core::session::SessionContext;
use crate::core::store::KeyValueStore;
use crate::ui::render::{render_error, render_message, render_notice};
use crate::ui::theme::Theme;
use std::error::Error;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

pub struct ChatOptions {
    pub theme: Theme,
    pub syntax: bool,
    /// Model to prefer whenever the list is refreshed
    pub preferred_model: Option<String>,
}

enum LoopAction {
    Continue,
    Quit,
}

pub async fn run_chat<S: KeyValueStore>(
    mut manager: ConversationManager<S>,
    session: SessionContext,
    options: ChatOptions,
) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    let mut channel = StreamChannel::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_banner(&manager, &session, &options.theme, &mut stdout)?;

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            writeln!(stdout)?;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let action = match process_input(&mut manager, &line) {
            CommandResult::ProcessAsMessage(text) => {
                send_message(&mut manager, &session, &mut channel, &text, &options, &mut stdout)
                    .await?;
                LoopAction::Continue
            }
            CommandResult::RefreshModels => {
                let preferred = options.preferred_model.as_deref();
                match load_models(&mut manager, &session, preferred).await {
                    Ok(count) => {
                        let current = manager.selected_model().unwrap_or("none");
                        let text = format!("{count} models available; using {current}");
                        writeln!(stdout, "{}", render_notice(&text, &options.theme))?;
                    }
                    Err(err) => {
                        let text = format!("Could not load models: {err}");
                        writeln!(stdout, "{}", render_error(&text, &options.theme))?;
                    }
                }
                LoopAction::Continue
            }
            other => show_command_result(other, &manager, &options, &mut stdout)?,
        };

        if matches!(action, LoopAction::Quit) {
            break;
        }
    }
    Ok(())
}

async fn send_message<S: KeyValueStore, W: Write>(
    manager: &mut ConversationManager<S>,
    session: &SessionContext,
    channel: &mut StreamChannel,
    text: &str,
    options: &ChatOptions,
    out: &mut W,
) -> io::Result<()> {
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let outcome = run_exchange(
        manager,
        session,
        channel,
        text,
        &options.theme,
        options.syntax,
        out,
        interrupt,
    )
    .await?;
    if let ExchangeOutcome::Rejected(rejection) = outcome {
        writeln!(out, "{}", render_error(&rejection.to_string(), &options.theme))?;
    }
    Ok(())
}

fn show_command_result<S: KeyValueStore, W: Write>(
    result: CommandResult,
    manager: &ConversationManager<S>,
    options: &ChatOptions,
    out: &mut W,
) -> io::Result<LoopAction> {
    match result {
        CommandResult::Notice(text) => {
            writeln!(out, "{}", render_notice(&text, &options.theme))?;
        }
        CommandResult::Error(text) => {
            writeln!(out, "{}", render_error(&text, &options.theme))?;
        }
        CommandResult::ShowConversation => print_transcript(manager, options, out)?,
        CommandResult::Quit => return Ok(LoopAction::Quit),
        CommandResult::ProcessAsMessage(_) | CommandResult::RefreshModels => {}
    }
    Ok(LoopAction::Continue)
}

fn print_transcript<S: KeyValueStore, W: Write>(
    manager: &ConversationManager<S>,
    options: &ChatOptions,
    out: &mut W,
) -> io::Result<()> {
    if let Some(conversation) = manager.active() {
        let header = format!("# {} ({})", conversation.title, conversation.model);
        writeln!(out, "{}", render_notice(&header, &options.theme))?;
    }
    for message in manager.view() {
        writeln!(
            out,
            "{}\n",
            render_message(message, &options.theme, options.syntax)
        )?;
    }
    Ok(())
}

fn print_banner<S: KeyValueStore, W: Write>(
    manager: &ConversationManager<S>,
    session: &SessionContext,
    theme: &Theme,
    out: &mut W,
) -> io::Result<()> {
    let model = match manager.selected_model() {
        Some(model) => model.to_string(),
        None => "none (use /model <name> or /models)".to_string(),
    };
    writeln!(
        out,
        "{}",
        render_notice(
            &format!(
                "ollama-chat | server {} | model {} | {} saved conversations",
                session.base_url,
                model,
                manager.conversations().len()
            ),
            theme
        )
    )?;
    writeln!(
        out,
        "{}",
        render_notice("Type /help for commands, /quit to leave.", theme)
    )
}
