//! ollama-chat is a terminal chat client for local Ollama-compatible model servers.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversation state, persistence, configuration, and
//!   streaming orchestration.
//! - [`ui`] renders transcripts and runs the interactive prompt loop.
//! - [`commands`] implements slash-command parsing and execution used by the
//!   chat loop.
//! - [`api`] defines the chat and model-listing payloads exchanged with the
//!   server.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration and dispatches into
//! [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
