//! Terminal presentation for chat sessions.
//!
//! - [`chat_loop`]: the prompt loop that dispatches input to
//!   [`crate::commands`] and streams replies via [`crate::core::chat_stream`].
//! - [`render`] and [`markdown`]: transcript formatting, with fenced code
//!   blocks split out for highlighting.
//! - [`theme`]: colour policy.
//!
//! This layer only presents state; [`crate::core`] owns it.

pub mod chat_loop;
pub mod markdown;
pub mod render;
pub mod theme;
