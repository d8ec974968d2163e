#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    New,
    List,
    Open,
    Delete,
    Rename,
    Model,
    Models,
    Help,
    Quit,
}

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub kind: CommandKind,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "new",
        usage: "/new [title]",
        help: "Start a new conversation, optionally with a title.",
        kind: CommandKind::New,
    },
    Command {
        name: "list",
        usage: "/list",
        help: "List saved conversations, newest first.",
        kind: CommandKind::List,
    },
    Command {
        name: "open",
        usage: "/open <id>",
        help: "Switch to a saved conversation.",
        kind: CommandKind::Open,
    },
    Command {
        name: "delete",
        usage: "/delete <id>",
        help: "Delete a saved conversation.",
        kind: CommandKind::Delete,
    },
    Command {
        name: "rename",
        usage: "/rename <title>",
        help: "Rename the current conversation.",
        kind: CommandKind::Rename,
    },
    Command {
        name: "model",
        usage: "/model [name]",
        help: "Show the current model or switch to another one.",
        kind: CommandKind::Model,
    },
    Command {
        name: "models",
        usage: "/models",
        help: "Refresh the list of models served by the backend.",
        kind: CommandKind::Models,
    },
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        kind: CommandKind::Help,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat.",
        kind: CommandKind::Quit,
    },
];
