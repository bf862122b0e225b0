//! Script invocation.
//!
//! A trigger hands its command text to a [`ScriptRunner`] as a
//! [`ScriptInvocation`]: the first whitespace-separated token names the
//! script, every token (name included) is passed along, and so is the raw
//! command text. The runner gets the [`Invoker`] that issued the command so
//! the script can call back into the console.
//!
//! [`LuaScriptRunner`] is the shipped runner.

pub mod lua;
mod primitives;

use std::path::PathBuf;

use thiserror::Error;

use crate::invoker::Invoker;

pub use lua::LuaScriptRunner;

/// Errors raised while resolving or running a script.
///
/// The display text is what the invoker sees in `print_error`.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The command text had no tokens.
    #[error("No script specified")]
    EmptyCommand,
    /// The script name contains characters outside `[A-Za-z0-9_-]`.
    #[error("Invalid script name: {0}")]
    InvalidName(String),
    /// No script file for the name.
    #[error("Unknown script: {name}")]
    NotFound {
        /// Requested script name.
        name: String,
        /// Path that was looked up.
        path: PathBuf,
    },
    /// The script file exists but could not be read.
    #[error("Failed to read script {}: {source}", path.display())]
    Io {
        /// Script file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The scripting environment could not be prepared.
    #[error("Failed to prepare script environment: {0}")]
    Setup(String),
    /// The script raised an error while running.
    #[error("{0}")]
    Runtime(String),
}

/// One parsed trigger command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    args: Vec<String>,
    command: String,
}

impl ScriptInvocation {
    /// Split `command` on whitespace and validate the script name.
    pub fn parse(command: &str) -> Result<Self, ScriptError> {
        let args: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        let Some(name) = args.first() else {
            return Err(ScriptError::EmptyCommand);
        };
        if !is_valid_script_name(name) {
            return Err(ScriptError::InvalidName(name.clone()));
        }
        Ok(Self {
            args,
            command: command.to_string(),
        })
    }

    /// The script name (first token).
    pub fn script(&self) -> &str {
        // parse() guarantees at least one token
        self.args.first().map_or("", String::as_str)
    }

    /// Every token, the script name first.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The tokens after the script name.
    pub fn arguments(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }

    /// The command text exactly as captured by the trigger.
    pub fn command(&self) -> &str {
        &self.command
    }
}

fn is_valid_script_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Runs a named script on behalf of an invoker.
pub trait ScriptRunner: Send + Sync {
    /// Run `invocation`, letting the script act through `invoker`.
    fn run(&self, invocation: &ScriptInvocation, invoker: &Invoker) -> Result<(), ScriptError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_whitespace() {
        let inv = ScriptInvocation::parse("ellipsoid  0 64\t0 stone").unwrap();
        assert_eq!(inv.script(), "ellipsoid");
        assert_eq!(inv.args(), ["ellipsoid", "0", "64", "0", "stone"]);
        assert_eq!(inv.arguments(), ["0", "64", "0", "stone"]);
        assert_eq!(inv.command(), "ellipsoid  0 64\t0 stone");
    }

    #[test]
    fn test_parse_name_only() {
        let inv = ScriptInvocation::parse("hello").unwrap();
        assert_eq!(inv.script(), "hello");
        assert!(inv.arguments().is_empty());
    }

    #[test]
    fn test_parse_empty_command() {
        assert!(matches!(
            ScriptInvocation::parse("   "),
            Err(ScriptError::EmptyCommand)
        ));
    }

    #[test]
    fn test_parse_rejects_path_like_names() {
        for name in ["../etc/passwd", "a/b", "dot.lua", "~home"] {
            assert!(
                matches!(
                    ScriptInvocation::parse(name),
                    Err(ScriptError::InvalidName(_))
                ),
                "{name} should be rejected"
            );
        }
        assert!(ScriptInvocation::parse("build-tower_2").is_ok());
    }

    #[test]
    fn test_error_messages_are_player_facing() {
        let err = ScriptError::NotFound {
            name: "nope".to_string(),
            path: PathBuf::from("scripts/nope.lua"),
        };
        assert_eq!(err.to_string(), "Unknown script: nope");
        assert_eq!(ScriptError::EmptyCommand.to_string(), "No script specified");
    }
}
