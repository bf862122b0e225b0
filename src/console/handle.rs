//! Shared console context for invokers and scripts.
//!
//! [`ConsoleHandle`] is what the trigger layer hands out by `Arc`: it can
//! inject commands into the input channel, format player-scoped commands,
//! write to the wrapper's real stdout/stderr and sleep the calling thread.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::config::ExecuteTemplate;
use crate::io::LineInjector;

/// A writer shared between threads.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Injection and printing capabilities shared by everything a trigger spawns.
pub struct ConsoleHandle {
    injector: LineInjector,
    execute_template: ExecuteTemplate,
    stdout: SharedWriter,
    stderr: SharedWriter,
}

impl std::fmt::Debug for ConsoleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleHandle")
            .field("execute_template", &self.execute_template.as_str())
            .finish_non_exhaustive()
    }
}

impl ConsoleHandle {
    /// Build a handle writing to the given streams.
    pub fn new(
        injector: LineInjector,
        execute_template: ExecuteTemplate,
        stdout: SharedWriter,
        stderr: SharedWriter,
    ) -> Self {
        Self {
            injector,
            execute_template,
            stdout,
            stderr,
        }
    }

    /// Inject `command` into the input channel as-is. Returns the command.
    pub fn execute(&self, command: &str) -> String {
        log::debug!("console execute: {command}");
        self.injector.writeln(command);
        command.to_string()
    }

    /// Format `command` to run as `name`, inject it and return it.
    pub fn execute_as(&self, name: &str, command: &str) -> String {
        let formatted = self.execute_template.format(name, command);
        self.execute(&formatted)
    }

    /// Block the calling thread for `millis` milliseconds.
    pub fn sleep(&self, millis: u64) {
        thread::sleep(Duration::from_millis(millis));
    }

    /// Write `message` and a newline to the real stdout.
    pub fn print_stdout(&self, message: &str) {
        write_line(&self.stdout, message);
    }

    /// Write `message` and a newline to the real stderr.
    pub fn print_stderr(&self, message: &str) {
        write_line(&self.stderr, message);
    }
}

/// One `write_all` per message, so a line-aware destination sees it whole.
fn write_line(writer: &SharedWriter, message: &str) {
    let line = format!("{message}\n");
    let mut out = writer.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = out.write_all(line.as_bytes()).and_then(|()| out.flush()) {
        log::warn!("Failed to write console message: {e}");
    }
}
