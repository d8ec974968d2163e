//! Saved conversation commands: `list`, `show` and `delete`.

use crate::commands::{format_conversation_line, sorted_by_recency};
use crate::core::manager::ConversationManager;
use crate::core::store::KeyValueStore;
use crate::ui::render::{render_message, render_notice};
use crate::ui::theme::Theme;
use std::error::Error;
use std::io::Write;

pub fn list_conversations<S: KeyValueStore, W: Write>(
    manager: &ConversationManager<S>,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    if manager.conversations().is_empty() {
        writeln!(out, "No saved conversations.")?;
        return Ok(());
    }
    for conversation in sorted_by_recency(manager.conversations()) {
        writeln!(out, "{}", format_conversation_line(conversation, false))?;
    }
    Ok(())
}

pub fn show_conversation<S: KeyValueStore, W: Write>(
    manager: &ConversationManager<S>,
    id: &str,
    theme: &Theme,
    syntax: bool,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let conversation = manager
        .conversation(id)
        .ok_or_else(|| format!("No conversation with id {id}"))?;

    let header = format!(
        "# {}\nModel: {} | Created {} | Updated {}",
        conversation.title,
        if conversation.model.is_empty() {
            "unknown"
        } else {
            conversation.model.as_str()
        },
        conversation.created_at.format("%Y-%m-%d %H:%M"),
        conversation.updated_at.format("%Y-%m-%d %H:%M"),
    );
    writeln!(out, "{}\n", render_notice(&header, theme))?;
    for message in &conversation.messages {
        writeln!(out, "{}\n", render_message(message, theme, syntax))?;
    }
    Ok(())
}

pub fn delete_conversation<S: KeyValueStore, W: Write>(
    manager: &mut ConversationManager<S>,
    id: &str,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    if !manager.delete(id) {
        return Err(format!("No conversation with id {id}").into());
    }
    writeln!(out, "Deleted conversation {id}")?;
    Ok(())
}
