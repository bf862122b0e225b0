//! Configuration loading and validation.
//!
//! [`WrapperConfig`] is the on-disk shape (`craftwrap.json`). Missing fields
//! fall back to [`Default`], a missing file is created with the defaults, and
//! a handful of `CRAFTWRAP_*` environment variables override what the file
//! says.
//!
//! [`WrapperConfig::triggers`] turns the raw strings into a validated
//! [`TriggerConfig`]. Every problem is a [`ConfigError`] surfaced at startup;
//! nothing is silently ignored.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// Errors found while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid JSON for [`WrapperConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A trigger pattern is not a valid regular expression.
    #[error("invalid {field} pattern: {source}")]
    Pattern {
        /// Config field holding the pattern.
        field: &'static str,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
    /// A trigger pattern has the wrong number of capture groups.
    #[error("{field} must have exactly {expected} capture group(s), found {found}")]
    CaptureGroups {
        /// Config field holding the pattern.
        field: &'static str,
        /// Required number of groups.
        expected: usize,
        /// Number of groups in the pattern.
        found: usize,
    },
    /// The execute command template is malformed.
    #[error("invalid execute_command template {template:?}: {reason}")]
    Template {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },
    /// No program to run for the wrapped server.
    #[error("server_command is empty")]
    EmptyServerCommand,
}

/// Configuration for the wrapper, as stored in `craftwrap.json`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct WrapperConfig {
    /// Pattern matched against trimmed stdin lines; one capture group (the command).
    pub input_trigger: String,
    /// Pattern matched against trimmed stdout lines; two groups (player name, command).
    pub output_trigger: String,
    /// Template for running a command as a player; `%s` slots take (name, command).
    pub execute_command: String,
    /// Directory searched for scripts.
    pub script_directory: PathBuf,
    /// Script file extension, including the dot.
    pub script_extension: String,
    /// Program and arguments used to start the wrapped server.
    pub server_command: Vec<String>,
    /// Working directory for the wrapped server (default: our own).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_directory: Option<PathBuf>,
    /// Console command injected when the wrapper receives SIGINT/SIGTERM/SIGHUP.
    pub stop_command: String,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            input_trigger: constants::DEFAULT_INPUT_TRIGGER.to_string(),
            output_trigger: constants::DEFAULT_OUTPUT_TRIGGER.to_string(),
            execute_command: constants::DEFAULT_EXECUTE_COMMAND.to_string(),
            script_directory: PathBuf::from(constants::DEFAULT_SCRIPT_DIRECTORY),
            script_extension: constants::DEFAULT_SCRIPT_EXTENSION.to_string(),
            server_command: constants::DEFAULT_SERVER_COMMAND
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            server_directory: None,
            stop_command: constants::DEFAULT_STOP_COMMAND.to_string(),
        }
    }
}

impl WrapperConfig {
    /// Directory for craftwrap's own files (logs), creating it if needed.
    ///
    /// `CRAFTWRAP_CONFIG_DIR` wins; otherwise the platform config directory
    /// (`~/.config/craftwrap` on Linux). Returns `None` if neither is usable.
    pub fn config_dir() -> Option<PathBuf> {
        let dir = match std::env::var("CRAFTWRAP_CONFIG_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::config_dir()?.join("craftwrap"),
        };
        fs::create_dir_all(&dir).ok()?;
        Some(dir)
    }

    /// Load the config at `path`, writing the defaults there if it is missing.
    ///
    /// Failing to write the default file is logged, not fatal.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                match config.save(path) {
                    Ok(()) => log::info!("Wrote default config to {}", path.display()),
                    Err(e) => log::warn!("Could not write default config: {e}"),
                }
                Ok(config)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write this config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    /// Apply `CRAFTWRAP_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(pattern) = lookup("CRAFTWRAP_INPUT_TRIGGER") {
            self.input_trigger = pattern;
        }
        if let Some(pattern) = lookup("CRAFTWRAP_OUTPUT_TRIGGER") {
            self.output_trigger = pattern;
        }
        if let Some(template) = lookup("CRAFTWRAP_EXECUTE_COMMAND") {
            self.execute_command = template;
        }
        if let Some(dir) = lookup("CRAFTWRAP_SCRIPT_DIR") {
            self.script_directory = PathBuf::from(dir);
        }
        if let Some(ext) = lookup("CRAFTWRAP_SCRIPT_EXTENSION") {
            self.script_extension = ext;
        }
    }

    /// Validate and compile the trigger patterns and execute template.
    pub fn triggers(&self) -> Result<TriggerConfig, ConfigError> {
        Ok(TriggerConfig {
            input: compile_trigger("input_trigger", &self.input_trigger, 1)?,
            output: compile_trigger("output_trigger", &self.output_trigger, 2)?,
            execute: ExecuteTemplate::parse(&self.execute_command)?,
        })
    }

    /// The server program and its arguments.
    pub fn server_program(&self) -> Result<(&str, &[String]), ConfigError> {
        match self.server_command.split_first() {
            Some((program, args)) => Ok((program.as_str(), args)),
            None => Err(ConfigError::EmptyServerCommand),
        }
    }
}

/// Compile `pattern` anchored to the whole line and check its group count.
fn compile_trigger(
    field: &'static str,
    pattern: &str,
    expected: usize,
) -> Result<Regex, ConfigError> {
    let pattern_err = |source| ConfigError::Pattern { field, source };

    // Validate the pattern as written before wrapping it.
    let found = Regex::new(pattern).map_err(pattern_err)?.captures_len() - 1;
    if found != expected {
        return Err(ConfigError::CaptureGroups {
            field,
            expected,
            found,
        });
    }
    Regex::new(&format!("^(?:{pattern})$")).map_err(pattern_err)
}

/// Validated trigger settings used by the console.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Whole-line input pattern with one group (command text).
    pub input: Regex,
    /// Whole-line output pattern with two groups (player name, command text).
    pub output: Regex,
    /// Template for executing a command as a player.
    pub execute: ExecuteTemplate,
}

/// One piece of a parsed [`ExecuteTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Name,
    Command,
}

/// A `printf`-style template with a player-name slot and a command slot.
///
/// Supported specifiers: `%s` (next slot in order: name, then command),
/// `%1$s` (name), `%2$s` (command) and `%%` (a literal `%`). Both slots must
/// appear at least once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl ExecuteTemplate {
    /// Parse and validate a template.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::Template {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut ordinary = 0usize;
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            let slot = match chars.next() {
                Some('%') => {
                    literal.push('%');
                    continue;
                }
                Some('s') => {
                    ordinary += 1;
                    match ordinary {
                        1 => Segment::Name,
                        2 => Segment::Command,
                        _ => return Err(invalid("more than two %s slots")),
                    }
                }
                Some(d @ ('1' | '2')) => {
                    if chars.next() != Some('$') || chars.next() != Some('s') {
                        return Err(invalid("indexed slots must look like %1$s or %2$s"));
                    }
                    if d == '1' {
                        Segment::Name
                    } else {
                        Segment::Command
                    }
                }
                Some(other) => return Err(invalid(&format!("unsupported specifier %{other}"))),
                None => return Err(invalid("dangling % at end of template")),
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(slot);
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.contains(&Segment::Name) || !segments.contains(&Segment::Command) {
            return Err(invalid("needs both a player-name slot and a command slot"));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Fill the slots with `name` and `command`.
    #[must_use]
    pub fn format(&self, name: &str, command: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + name.len() + command.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(name),
                Segment::Command => out.push_str(command),
            }
        }
        out
    }

    /// The template as written in the config.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
