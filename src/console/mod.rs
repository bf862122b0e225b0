//! Trigger and dispatch layer.
//!
//! [`Console::install`] subscribes an [`InputTrigger`] on the input channel
//! and an [`OutputTrigger`] on the output channel, and starts the dispatch
//! worker both of them feed.
//!
//! ```text
//! input line ──► InputTrigger ──┐ (cancel)
//!                               ├──► DispatchQueue ──► script-dispatch ──► ScriptRunner
//! output line ─► OutputTrigger ─┘                                              │
//!                                                     Invoker ◄────────────────┘
//!                                                        │ execute / print
//!                                                        ▼
//!                                                 ConsoleHandle ──► input channel
//! ```

pub mod dispatch;
pub mod handle;
pub mod trigger;

use std::io::{self, Write};
use std::sync::Arc;

use crate::config::TriggerConfig;
use crate::io::{InterceptedInput, InterceptedOutput};
use crate::line::LineSubscriber;
use crate::script::ScriptRunner;

pub use dispatch::{DispatchQueue, DispatchWorker, Dispatcher};
pub use handle::{ConsoleHandle, SharedWriter};
pub use trigger::{InputTrigger, OutputTrigger};

/// The installed trigger layer.
///
/// Dropping it stops the dispatch worker after queued commands finish. The
/// triggers stay subscribed on their channels; commands they submit after
/// that are logged and dropped.
#[derive(Debug)]
pub struct Console {
    handle: Arc<ConsoleHandle>,
    input_trigger: Arc<InputTrigger>,
    output_trigger: Arc<OutputTrigger>,
    worker: DispatchWorker,
}

impl Console {
    /// Wire triggers onto `input` and `output` and start dispatching to
    /// `runner`.
    ///
    /// `stdout` and `stderr` are where server-invoker messages go.
    pub fn install<W: Write>(
        triggers: TriggerConfig,
        runner: Arc<dyn ScriptRunner>,
        input: &mut InterceptedInput,
        output: &mut InterceptedOutput<W>,
        stdout: SharedWriter,
        stderr: SharedWriter,
    ) -> io::Result<Self> {
        let TriggerConfig {
            input: input_pattern,
            output: output_pattern,
            execute,
        } = triggers;

        let handle = Arc::new(ConsoleHandle::new(
            input.injector(),
            execute,
            stdout,
            stderr,
        ));
        let worker = DispatchWorker::spawn(Dispatcher::new(runner))?;

        let input_trigger = Arc::new(InputTrigger::new(
            input_pattern,
            Arc::clone(&handle),
            worker.queue(),
        ));
        let output_trigger = Arc::new(OutputTrigger::new(
            output_pattern,
            Arc::clone(&handle),
            worker.queue(),
        ));

        input.subscribe(Arc::clone(&input_trigger) as Arc<dyn LineSubscriber>);
        output.subscribe(Arc::clone(&output_trigger) as Arc<dyn LineSubscriber>);
        log::info!("Console triggers installed");

        Ok(Self {
            handle,
            input_trigger,
            output_trigger,
            worker,
        })
    }

    /// The shared console context.
    pub fn handle(&self) -> &Arc<ConsoleHandle> {
        &self.handle
    }

    /// Inject `command` into the input channel.
    pub fn execute(&self, command: &str) -> String {
        self.handle.execute(command)
    }

    /// Remove both triggers from their channels.
    pub fn uninstall<W: Write>(
        &self,
        input: &mut InterceptedInput,
        output: &mut InterceptedOutput<W>,
    ) {
        input.unsubscribe(&self.input_trigger);
        output.unsubscribe(&self.output_trigger);
        self.worker.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WrapperConfig;
    use crate::constants::LINE_SEPARATOR;
    use crate::invoker::Invoker;
    use crate::script::{ScriptError, ScriptInvocation};
    use std::sync::mpsc::{self, Sender};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Forwards every invocation to a channel.
    struct ChannelRunner {
        tx: Mutex<Sender<(String, Vec<String>, Option<String>)>>,
    }

    impl ScriptRunner for ChannelRunner {
        fn run(&self, invocation: &ScriptInvocation, invoker: &Invoker) -> Result<(), ScriptError> {
            self.tx
                .lock()
                .unwrap()
                .send((
                    invocation.script().to_string(),
                    invocation.args().to_vec(),
                    invoker.name().map(str::to_string),
                ))
                .unwrap();
            Ok(())
        }
    }

    fn read_line(input: &mut InterceptedInput) -> String {
        let mut bytes = Vec::new();
        while !bytes.ends_with(LINE_SEPARATOR.as_bytes()) {
            bytes.push(input.read_byte().unwrap());
        }
        String::from_utf8(bytes).unwrap().trim_end().to_string()
    }

    #[test]
    fn test_input_trigger_cancels_and_dispatches() {
        let (tx, rx) = mpsc::channel();
        let runner = Arc::new(ChannelRunner { tx: Mutex::new(tx) });
        let mut input = InterceptedInput::new();
        let mut output = InterceptedOutput::new(Vec::new());

        let _console = Console::install(
            WrapperConfig::default().triggers().unwrap(),
            runner,
            &mut input,
            &mut output,
            Arc::new(Mutex::new(Vec::new())) as SharedWriter,
            Arc::new(Mutex::new(Vec::new())) as SharedWriter,
        )
        .unwrap();

        input.writeln("  !say hi  ");
        input.writeln("list");
        assert_eq!(read_line(&mut input), "list");

        let (script, args, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(script, "say");
        assert_eq!(args, ["say", "hi"]);
        assert_eq!(name, None);
    }

    #[test]
    fn test_output_trigger_dispatches_player_without_cancelling() {
        let (tx, rx) = mpsc::channel();
        let runner = Arc::new(ChannelRunner { tx: Mutex::new(tx) });
        let mut input = InterceptedInput::new();
        let mut output = InterceptedOutput::new(Vec::new());

        let _console = Console::install(
            WrapperConfig::default().triggers().unwrap(),
            runner,
            &mut input,
            &mut output,
            Arc::new(Mutex::new(Vec::new())) as SharedWriter,
            Arc::new(Mutex::new(Vec::new())) as SharedWriter,
        )
        .unwrap();

        let chat = "[10:00:00] [Server thread/INFO]: <Steve> !triangle 1 2 3\n";
        output.write_all(chat.as_bytes()).unwrap();
        assert_eq!(output.get_ref().as_slice(), chat.as_bytes());

        let (script, args, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(script, "triangle");
        assert_eq!(args, ["triangle", "1", "2", "3"]);
        assert_eq!(name.as_deref(), Some("Steve"));
    }

    #[test]
    fn test_uninstall_removes_triggers() {
        let (tx, _rx) = mpsc::channel();
        let runner = Arc::new(ChannelRunner { tx: Mutex::new(tx) });
        let mut input = InterceptedInput::new();
        let mut output = InterceptedOutput::new(Vec::new());

        let console = Console::install(
            WrapperConfig::default().triggers().unwrap(),
            runner,
            &mut input,
            &mut output,
            Arc::new(Mutex::new(Vec::new())) as SharedWriter,
            Arc::new(Mutex::new(Vec::new())) as SharedWriter,
        )
        .unwrap();
        assert_eq!(input.bus().len(), 1);
        assert_eq!(output.bus().len(), 1);

        console.uninstall(&mut input, &mut output);
        assert!(input.bus().is_empty());
        assert!(output.bus().is_empty());

        input.writeln("!say hi");
        assert_eq!(read_line(&mut input), "!say hi");
    }
}
