//! Line subscribers that turn matching lines into script commands.

use std::sync::Arc;

use regex::Regex;

use crate::invoker::Invoker;
use crate::line::{LineEvent, LineSubscriber};

use super::dispatch::DispatchQueue;
use super::handle::ConsoleHandle;

/// Watches the operator's input for commands.
///
/// The pattern has one capture group, the command text. A matching line is
/// cancelled so the wrapped server never sees it, and the command runs for
/// the server invoker.
pub struct InputTrigger {
    pattern: Regex,
    console: Arc<ConsoleHandle>,
    queue: DispatchQueue,
}

impl std::fmt::Debug for InputTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputTrigger")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

impl InputTrigger {
    /// Trigger on `pattern`, dispatching through `queue`.
    pub fn new(pattern: Regex, console: Arc<ConsoleHandle>, queue: DispatchQueue) -> Self {
        Self {
            pattern,
            console,
            queue,
        }
    }
}

impl LineSubscriber for InputTrigger {
    fn on_line(&self, event: &mut LineEvent) {
        let Some(caps) = self.pattern.captures(event.line().trim()) else {
            return;
        };
        let command = caps.get(1).map_or("", |m| m.as_str());
        log::debug!("input trigger matched: {command}");

        self.queue
            .submit(Invoker::server(Arc::clone(&self.console)), command);
        event.cancel();
    }
}

/// Watches the server's output for player chat commands.
///
/// The pattern has two capture groups: player name, then command text. The
/// line itself is left alone; it has already reached the real stdout.
pub struct OutputTrigger {
    pattern: Regex,
    console: Arc<ConsoleHandle>,
    queue: DispatchQueue,
}

impl std::fmt::Debug for OutputTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputTrigger")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

impl OutputTrigger {
    /// Trigger on `pattern`, dispatching through `queue`.
    pub fn new(pattern: Regex, console: Arc<ConsoleHandle>, queue: DispatchQueue) -> Self {
        Self {
            pattern,
            console,
            queue,
        }
    }
}

impl LineSubscriber for OutputTrigger {
    fn on_line(&self, event: &mut LineEvent) {
        let Some(caps) = self.pattern.captures(event.line().trim()) else {
            return;
        };
        let name = caps.get(1).map_or("", |m| m.as_str());
        let command = caps.get(2).map_or("", |m| m.as_str());
        log::debug!("output trigger matched for {name}: {command}");

        self.queue
            .submit(Invoker::player(name, Arc::clone(&self.console)), command);
    }
}
