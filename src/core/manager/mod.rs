//! Conversation state and the transitions that mutate it.
//!
//! [`ConversationManager`] is the single owner of the saved collection, the
//! active conversation, the visible message view, model selection, and the
//! in-flight stream. Every mutation of the collection is followed by one
//! full-collection write to the backing store.

use crate::api::models::pick_initial_model;
use crate::api::{ChatMessage, ModelInfo};
use crate::core::config::Config;
use crate::core::conversation::Conversation;
use crate::core::message::Message;
use crate::core::store::{ConversationStore, KeyValueStore};
use chrono::{DateTime, Utc};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Shown in place of a reply when the request itself failed.
pub const REQUEST_ERROR_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";

/// Appended to partial content when a stream breaks off mid-reply.
pub const STREAM_INTERRUPTED_MARKER: &str = "[Response interrupted: the connection to the model server failed.]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRejection {
    EmptyInput,
    TooLong { max: usize, actual: usize },
    Busy,
    NoModel,
}

impl fmt::Display for SendRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendRejection::EmptyInput => write!(f, "Nothing to send"),
            SendRejection::TooLong { max, actual } => write!(
                f,
                "Message is {actual} characters long; the limit is {max}"
            ),
            SendRejection::Busy => write!(f, "Still waiting for the previous reply"),
            SendRejection::NoModel => {
                write!(f, "No model selected; use /models or /model <name>")
            }
        }
    }
}

impl std::error::Error for SendRejection {}

/// Everything a stream task needs, captured when the send begins.
#[derive(Debug, Clone)]
pub struct StreamTicket {
    pub stream_id: u64,
    pub conversation_id: String,
    pub model: String,
    pub api_messages: Vec<ChatMessage>,
    pub cancel_token: CancellationToken,
}

#[derive(Debug)]
struct ActiveStream {
    stream_id: u64,
    conversation_id: String,
    accumulated: String,
    cancel_token: CancellationToken,
}

pub struct ConversationManager<S> {
    store: ConversationStore<S>,
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    view: Vec<Message>,
    selected_model: Option<String>,
    available_models: Vec<ModelInfo>,
    stream: Option<ActiveStream>,
    last_stream_id: u64,
    title_max_len: usize,
    max_message_length: usize,
}

impl<S: KeyValueStore> ConversationManager<S> {
    /// Build a manager over `store`, reading whatever collection it holds.
    pub fn load(store: S, config: &Config) -> Self {
        let store = ConversationStore::new(store, config.storage.chats_key.clone());
        let conversations = store.load();
        debug!(count = conversations.len(), "Loaded saved conversations");
        Self {
            store,
            conversations,
            active_id: None,
            view: Vec::new(),
            selected_model: None,
            available_models: Vec::new(),
            stream: None,
            last_stream_id: 0,
            title_max_len: config.ui.chat_title_max_length,
            max_message_length: config.ui.max_message_length,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.conversation(id))
    }

    pub fn view(&self) -> &[Message] {
        &self.view
    }

    pub fn selected_model(&self) -> Option<&str> {
        self.selected_model.as_deref()
    }

    pub fn available_models(&self) -> &[ModelInfo] {
        &self.available_models
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn streaming_conversation_id(&self) -> Option<&str> {
        self.stream.as_ref().map(|s| s.conversation_id.as_str())
    }

    pub fn store(&self) -> &S {
        self.store.inner()
    }

    /// Record the backend's model list; selects one if nothing is selected yet.
    pub fn set_available_models(
        &mut self,
        models: Vec<ModelInfo>,
        preferred: Option<&str>,
    ) -> Option<&str> {
        if self.selected_model.is_none() {
            self.selected_model = pick_initial_model(&models, preferred);
        }
        self.available_models = models;
        self.selected_model.as_deref()
    }

    /// Select a model; the active conversation records it as its model.
    pub fn set_model(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.is_streaming() {
            return false;
        }
        self.selected_model = Some(name.to_string());

        let now = Utc::now();
        if let Some(conv) = self.active_mut() {
            if conv.model != name {
                conv.model = name.to_string();
                conv.updated_at = now;
                self.persist();
            }
        }
        true
    }

    pub fn create(&mut self, title: Option<String>) -> String {
        self.interrupt_stream("new conversation created");

        let now = Utc::now();
        let id = self.generate_id(now);
        let model = self.selected_model.clone().unwrap_or_default();
        self.conversations
            .push(Conversation::new(id.clone(), title, model, now));
        self.active_id = Some(id.clone());
        self.view.clear();
        self.persist();
        debug!(id = %id, "Created conversation");
        id
    }

    pub fn select(&mut self, id: &str) -> bool {
        let Some(conv) = self.conversation(id) else {
            return false;
        };
        let messages = conv.messages.clone();
        let model = (!conv.model.is_empty()).then(|| conv.model.clone());

        if self.streaming_conversation_id() != Some(id)
            && self.interrupt_stream("switched conversation")
        {
            self.persist();
        }

        self.view = messages;
        if model.is_some() {
            self.selected_model = model;
        }
        self.active_id = Some(id.to_string());
        true
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let Some(index) = self.conversations.iter().position(|c| c.id == id) else {
            return false;
        };
        if self.streaming_conversation_id() == Some(id) {
            self.interrupt_stream("conversation deleted");
        }

        self.conversations.remove(index);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
            self.view.clear();
        }
        self.persist();
        true
    }

    /// Replace the active conversation's messages. No-op without an active conversation.
    pub fn update(&mut self, messages: Vec<Message>) -> bool {
        let title_max_len = self.title_max_len;
        let now = Utc::now();
        let Some(conv) = self.active_mut() else {
            return false;
        };
        conv.replace_messages(messages.clone(), title_max_len, now);
        self.view = messages;
        self.persist();
        true
    }

    pub fn rename(&mut self, id: &str, title: &str) -> bool {
        let now = Utc::now();
        let renamed = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .is_some_and(|conv| conv.rename(title, now));
        if renamed {
            self.persist();
        }
        renamed
    }

    pub fn can_send(&self, input: &str) -> Result<(), SendRejection> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SendRejection::EmptyInput);
        }
        let actual = trimmed.chars().count();
        if actual > self.max_message_length {
            return Err(SendRejection::TooLong {
                max: self.max_message_length,
                actual,
            });
        }
        if self.is_streaming() {
            return Err(SendRejection::Busy);
        }
        if self.selected_model.is_none() {
            return Err(SendRejection::NoModel);
        }
        Ok(())
    }

    /// Append the user's message and an empty assistant placeholder, then
    /// hand back what the stream task needs.
    pub fn begin_send(&mut self, input: &str) -> Result<StreamTicket, SendRejection> {
        self.can_send(input)?;
        let model = self.selected_model.clone().ok_or(SendRejection::NoModel)?;

        if self.active().is_none() {
            self.create(None);
        }
        let conversation_id = self.active_id.clone().unwrap_or_default();

        let mut messages = self.view.clone();
        messages.push(Message::user(input.trim()));
        let api_messages = messages.iter().map(Message::to_api).collect();
        messages.push(Message::assistant(""));
        self.update(messages);

        self.last_stream_id += 1;
        let cancel_token = CancellationToken::new();
        self.stream = Some(ActiveStream {
            stream_id: self.last_stream_id,
            conversation_id: conversation_id.clone(),
            accumulated: String::new(),
            cancel_token: cancel_token.clone(),
        });

        Ok(StreamTicket {
            stream_id: self.last_stream_id,
            conversation_id,
            model,
            api_messages,
            cancel_token,
        })
    }

    /// Fold a streamed fragment into the placeholder. Stale stream ids are rejected.
    pub fn apply_chunk(&mut self, stream_id: u64, fragment: &str) -> bool {
        if fragment.is_empty() {
            return false;
        }
        let Some(content) = self.current_stream_mut(stream_id).map(|stream| {
            stream.accumulated.push_str(fragment);
            stream.accumulated.clone()
        }) else {
            debug!(stream_id, "Dropping fragment from stale stream");
            return false;
        };
        self.replace_placeholder(content)
    }

    /// Close out a stream that failed. Content received so far is kept with a
    /// marker; with nothing received the placeholder becomes a fixed notice.
    pub fn fail_stream(&mut self, stream_id: u64, detail: &str) -> bool {
        let Some(stream) = self.take_stream(stream_id) else {
            return false;
        };
        error!(stream_id, conversation = %stream.conversation_id, error = %detail, "Chat request failed");

        let content = if stream.accumulated.is_empty() {
            REQUEST_ERROR_MESSAGE.to_string()
        } else {
            format!("{}\n\n{}", stream.accumulated, STREAM_INTERRUPTED_MARKER)
        };
        self.replace_placeholder(content)
    }

    pub fn finish_stream(&mut self, stream_id: u64) -> bool {
        match self.take_stream(stream_id) {
            Some(stream) => {
                debug!(stream_id, chars = stream.accumulated.chars().count(), "Stream finished");
                true
            }
            None => false,
        }
    }

    /// User-requested stop. Partial content stays; an untouched placeholder is removed.
    pub fn cancel_stream(&mut self) -> bool {
        if self.stream.is_none() {
            return false;
        }
        if self.interrupt_stream("stopped by user") {
            self.persist();
        }
        true
    }

    fn replace_placeholder(&mut self, content: String) -> bool {
        let mut messages = self.view.clone();
        match messages.last_mut().filter(|m| m.is_assistant()) {
            Some(last) => last.content = content,
            None => messages.push(Message::assistant(content)),
        }
        self.update(messages)
    }

    fn current_stream_mut(&mut self, stream_id: u64) -> Option<&mut ActiveStream> {
        let active_id = self.active_id.as_deref();
        self.stream
            .as_mut()
            .filter(|s| s.stream_id == stream_id && Some(s.conversation_id.as_str()) == active_id)
    }

    fn take_stream(&mut self, stream_id: u64) -> Option<ActiveStream> {
        self.current_stream_mut(stream_id)?;
        self.stream.take()
    }

    /// Cancel the in-flight stream, if any. A placeholder that received
    /// nothing is dropped from its conversation; returns `true` when that
    /// left the collection unsaved.
    fn interrupt_stream(&mut self, reason: &str) -> bool {
        let Some(stream) = self.stream.take() else {
            return false;
        };
        debug!(stream_id = stream.stream_id, reason, "Cancelling in-flight stream");
        stream.cancel_token.cancel();
        if !stream.accumulated.is_empty() {
            return false;
        }
        let Some(conv) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == stream.conversation_id)
        else {
            return false;
        };
        if !conv
            .messages
            .last()
            .is_some_and(|m| m.is_assistant() && m.content.is_empty())
        {
            return false;
        }
        conv.messages.pop();
        if self.active_id.as_deref() == Some(stream.conversation_id.as_str()) {
            self.view.pop();
        }
        true
    }

    fn active_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn generate_id(&self, now: DateTime<Utc>) -> String {
        let mut candidate = now.timestamp_millis();
        while self.conversation(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.conversations) {
            error!(error = %err, "Failed to save conversations");
        }
    }
}

#[cfg(test)]
mod tests;
