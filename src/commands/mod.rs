//! Slash commands typed at the chat prompt.

mod registry;

pub use registry::{all_commands, find_command, Command, CommandInvocation, CommandKind};

use crate::api::models::model_label;
use crate::core::conversation::Conversation;
use crate::core::manager::ConversationManager;
use crate::core::store::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Handled; show this text.
    Notice(String),
    Error(String),
    /// The active conversation changed; redraw its transcript.
    ShowConversation,
    RefreshModels,
    ProcessAsMessage(String),
    Quit,
}

pub fn process_input<S: KeyValueStore>(
    manager: &mut ConversationManager<S>,
    input: &str,
) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    let Some(command) = find_command(command_name) else {
        return CommandResult::Error(format!(
            "Unknown command: /{command_name}. Type /help for the list."
        ));
    };
    let invocation = CommandInvocation {
        input: trimmed,
        args,
    };

    match command.kind {
        CommandKind::New => handle_new(manager, invocation),
        CommandKind::List => handle_list(manager),
        CommandKind::Open => handle_open(manager, invocation),
        CommandKind::Delete => handle_delete(manager, invocation),
        CommandKind::Rename => handle_rename(manager, invocation),
        CommandKind::Model => handle_model(manager, invocation),
        CommandKind::Models => CommandResult::RefreshModels,
        CommandKind::Help => CommandResult::Notice(help_text()),
        CommandKind::Quit => CommandResult::Quit,
    }
}

pub fn help_text() -> String {
    let width = all_commands()
        .iter()
        .map(|c| c.usage.len())
        .max()
        .unwrap_or(0);
    let mut text = String::from("Commands:");
    for command in all_commands() {
        text.push_str(&format!(
            "\n  {:<width$}  {}",
            command.usage,
            command.help,
            width = width
        ));
    }
    text.push_str("\nAnything else is sent to the model. Ctrl+C stops a reply in progress.");
    text
}

/// One listing line: marker, id, title, message count and last update.
pub fn format_conversation_line(conversation: &Conversation, active: bool) -> String {
    let marker = if active { '*' } else { ' ' };
    format!(
        "{marker} {}  {}  ({} messages, updated {})",
        conversation.id,
        conversation.title,
        conversation.messages.len(),
        conversation.updated_at.format("%Y-%m-%d %H:%M")
    )
}

/// Conversations ordered newest first.
pub fn sorted_by_recency(conversations: &[Conversation]) -> Vec<&Conversation> {
    let mut sorted: Vec<&Conversation> = conversations.iter().collect();
    sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sorted
}

fn handle_new<S: KeyValueStore>(
    manager: &mut ConversationManager<S>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let title = (!invocation.args.is_empty()).then(|| invocation.args.to_string());
    let id = manager.create(title);
    let title = manager
        .conversation(&id)
        .map(|c| c.title.clone())
        .unwrap_or_default();
    CommandResult::Notice(format!("Started conversation {id}: {title}"))
}

fn handle_list<S: KeyValueStore>(manager: &ConversationManager<S>) -> CommandResult {
    if manager.conversations().is_empty() {
        return CommandResult::Notice("No saved conversations.".to_string());
    }
    let active = manager.active_id();
    let lines: Vec<String> = sorted_by_recency(manager.conversations())
        .into_iter()
        .map(|c| format_conversation_line(c, Some(c.id.as_str()) == active))
        .collect();
    CommandResult::Notice(lines.join("\n"))
}

fn handle_open<S: KeyValueStore>(
    manager: &mut ConversationManager<S>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::Error("Usage: /open <id>".to_string());
    }
    if manager.select(invocation.args) {
        CommandResult::ShowConversation
    } else {
        CommandResult::Error(format!("No conversation with id {}", invocation.args))
    }
}

fn handle_delete<S: KeyValueStore>(
    manager: &mut ConversationManager<S>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::Error("Usage: /delete <id>".to_string());
    }
    if manager.delete(invocation.args) {
        CommandResult::Notice(format!("Deleted conversation {}", invocation.args))
    } else {
        CommandResult::Error(format!("No conversation with id {}", invocation.args))
    }
}

fn handle_rename<S: KeyValueStore>(
    manager: &mut ConversationManager<S>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::Error("Usage: /rename <title>".to_string());
    }
    let Some(id) = manager.active_id().map(str::to_string) else {
        return CommandResult::Error("No active conversation to rename".to_string());
    };
    if manager.rename(&id, invocation.args) {
        CommandResult::Notice(format!("Renamed to: {}", invocation.args))
    } else {
        CommandResult::Error("Could not rename conversation".to_string())
    }
}

fn handle_model<S: KeyValueStore>(
    manager: &mut ConversationManager<S>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        let current = manager.selected_model().unwrap_or("none");
        let mut text = format!("Current model: {current}");
        if !manager.available_models().is_empty() {
            text.push_str("\nAvailable:");
            for model in manager.available_models() {
                text.push_str(&format!("\n  {}", model_label(model)));
            }
        }
        return CommandResult::Notice(text);
    }

    let name = invocation.args;
    let listed = manager.available_models().iter().any(|m| m.name == name);
    if !manager.available_models().is_empty() && !listed {
        return CommandResult::Error(format!(
            "Model '{name}' is not served by the backend. Use /models to refresh the list."
        ));
    }
    if manager.set_model(name) {
        CommandResult::Notice(format!("Using model {name}"))
    } else {
        CommandResult::Error("Cannot switch models while a reply is streaming".to_string())
    }
}
