//! Who issued a trigger command, and how to answer them.
//!
//! An [`Invoker`] is the capability object a script calls back into. The
//! server console gets plain text on the wrapper's stdout/stderr and raw
//! command injection. A player gets `tellraw` chat messages and commands
//! wrapped in the configured execute template so they run as that player.

use std::sync::Arc;

use serde_json::Value;

use crate::console::ConsoleHandle;

/// Chat color for [`Invoker::print`].
pub const MESSAGE_COLOR: &str = "white";
/// Chat color for [`Invoker::print_error`].
pub const ERROR_COLOR: &str = "red";

/// The kind of actor behind a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokerKind {
    /// The operator typing into the server console.
    Server,
    /// A player, by in-game name.
    Player(String),
}

/// The issuer of a trigger command, bound to the console it came through.
#[derive(Debug, Clone)]
pub struct Invoker {
    kind: InvokerKind,
    console: Arc<ConsoleHandle>,
}

impl Invoker {
    /// The server console operator.
    pub fn server(console: Arc<ConsoleHandle>) -> Self {
        Self {
            kind: InvokerKind::Server,
            console,
        }
    }

    /// The player `name`.
    pub fn player(name: impl Into<String>, console: Arc<ConsoleHandle>) -> Self {
        Self {
            kind: InvokerKind::Player(name.into()),
            console,
        }
    }

    /// Which kind of actor this is.
    pub fn kind(&self) -> &InvokerKind {
        &self.kind
    }

    /// True for the server console.
    pub fn is_server(&self) -> bool {
        matches!(self.kind, InvokerKind::Server)
    }

    /// The player name, or `None` for the server.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            InvokerKind::Server => None,
            InvokerKind::Player(name) => Some(name),
        }
    }

    /// The console this invoker talks through.
    pub fn console(&self) -> &Arc<ConsoleHandle> {
        &self.console
    }

    /// Run `command` on behalf of this invoker and return what was injected.
    ///
    /// Players have the command wrapped in the execute template.
    pub fn execute(&self, command: &str) -> String {
        match &self.kind {
            InvokerKind::Server => self.console.execute(command),
            InvokerKind::Player(name) => self.console.execute_as(name, command),
        }
    }

    /// Show `message` to this invoker.
    ///
    /// Returns what was sent: the message itself for the server, the
    /// injected `tellraw` command for a player.
    pub fn print(&self, message: &str) -> String {
        self.send_message(message, MESSAGE_COLOR, |console| console.print_stdout(message))
    }

    /// Show `message` as an error. Returns what was sent, as for
    /// [`Invoker::print`].
    pub fn print_error(&self, message: &str) -> String {
        self.send_message(message, ERROR_COLOR, |console| console.print_stderr(message))
    }

    /// Show `message` in `color`. The server console has no colors and
    /// gets plain stdout text.
    pub fn print_colored(&self, message: &str, color: &str) -> String {
        self.send_message(message, color, |console| console.print_stdout(message))
    }

    /// Send a raw `tellraw` JSON component to this player.
    ///
    /// Returns the injected command, or `None` for the server.
    pub fn tellraw(&self, json: &str) -> Option<String> {
        let name = self.name()?;
        Some(self.console.execute(&format!("tellraw {name} {json}")))
    }

    fn send_message(
        &self,
        message: &str,
        color: &str,
        server: impl FnOnce(&ConsoleHandle),
    ) -> String {
        match &self.kind {
            InvokerKind::Server => {
                server(&self.console);
                message.to_string()
            }
            InvokerKind::Player(name) => {
                // Value's Display escapes the strings as JSON literals.
                let json = format!(
                    r#"{{"text":{},"color":{}}}"#,
                    Value::from(message),
                    Value::from(color)
                );
                self.console.execute(&format!("tellraw {name} {json}"))
            }
        }
    }
}
