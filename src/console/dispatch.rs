//! Script dispatch and the background worker that runs it.
//!
//! Triggers decide synchronously, inside the publish call, whether a line is
//! a command. Running the script happens here, on the `script-dispatch`
//! thread, so a script that sleeps or injects many commands never stalls the
//! interception channels. Requests run one at a time in submission order.

// Rust guideline compliant 2026-02

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::constants::DISPATCH_THREAD_NAME;
use crate::invoker::Invoker;
use crate::script::{ScriptError, ScriptInvocation, ScriptRunner};

/// How often an idle worker checks for shutdown.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Turns command text into a script run and reports failures.
pub struct Dispatcher {
    runner: Arc<dyn ScriptRunner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Dispatch through `runner`.
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    /// Parse `command` and run it for `invoker`.
    ///
    /// Any failure is logged and shown to the invoker once via
    /// [`Invoker::print_error`]; nothing propagates. Returns whether the
    /// script completed.
    pub fn dispatch(&self, invoker: &Invoker, command: &str) -> bool {
        match self.try_dispatch(invoker, command) {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "Script command {:?} from {} failed: {e}",
                    command,
                    invoker.name().unwrap_or("server")
                );
                invoker.print_error(&e.to_string());
                false
            }
        }
    }

    fn try_dispatch(&self, invoker: &Invoker, command: &str) -> Result<(), ScriptError> {
        let invocation = ScriptInvocation::parse(command)?;
        log::info!(
            "Running script '{}' for {}",
            invocation.script(),
            invoker.name().unwrap_or("server")
        );
        self.runner.run(&invocation, invoker)
    }
}

/// A command waiting for the dispatch worker.
#[derive(Debug)]
struct DispatchRequest {
    invoker: Invoker,
    command: String,
}

/// Cloneable sending side of the dispatch worker's queue.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: Sender<DispatchRequest>,
}

impl DispatchQueue {
    /// Queue `command` to run for `invoker`.
    pub fn submit(&self, invoker: Invoker, command: impl Into<String>) {
        let request = DispatchRequest {
            invoker,
            command: command.into(),
        };
        if let Err(mpsc::SendError(request)) = self.tx.send(request) {
            log::warn!("Dispatch worker gone, dropping command: {}", request.command);
        }
    }
}

/// Background thread running queued script commands in order.
pub struct DispatchWorker {
    queue: DispatchQueue,
    shutdown: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for DispatchWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchWorker")
            .field("shutdown", &self.shutdown.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl DispatchWorker {
    /// Start the worker thread.
    pub fn spawn(dispatcher: Dispatcher) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let thread_handle = thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_string())
            .spawn(move || Self::worker_loop(&dispatcher, &rx, &shutdown_clone))?;

        Ok(Self {
            queue: DispatchQueue { tx },
            shutdown,
            thread_handle: Some(thread_handle),
        })
    }

    fn worker_loop(
        dispatcher: &Dispatcher,
        rx: &Receiver<DispatchRequest>,
        shutdown: &AtomicBool,
    ) {
        log::info!("Script dispatch worker started");
        loop {
            if shutdown.load(Ordering::SeqCst) {
                while let Ok(request) = rx.try_recv() {
                    dispatcher.dispatch(&request.invoker, &request.command);
                }
                log::info!("Script dispatch worker shutting down");
                break;
            }

            match rx.recv_timeout(SHUTDOWN_POLL) {
                Ok(request) => {
                    dispatcher.dispatch(&request.invoker, &request.command);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Script dispatch worker: queue disconnected");
                    break;
                }
            }
        }
    }

    /// A handle for submitting commands.
    pub fn queue(&self) -> DispatchQueue {
        self.queue.clone()
    }

    /// Ask the worker to finish queued commands and stop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Script dispatch worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecuteTemplate;
    use crate::console::{ConsoleHandle, SharedWriter};
    use crate::io::InterceptedInput;
    use std::sync::Mutex;

    /// Records invocations; fails for the script named "boom".
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<(String, Vec<String>, Option<String>)>>,
    }

    impl ScriptRunner for RecordingRunner {
        fn run(&self, invocation: &ScriptInvocation, invoker: &Invoker) -> Result<(), ScriptError> {
            self.calls.lock().unwrap().push((
                invocation.script().to_string(),
                invocation.args().to_vec(),
                invoker.name().map(str::to_string),
            ));
            if invocation.script() == "boom" {
                return Err(ScriptError::Runtime("boom.lua:1: kaboom".to_string()));
            }
            Ok(())
        }
    }

    fn server_invoker(err: &Arc<Mutex<Vec<u8>>>) -> (InterceptedInput, Invoker) {
        let input = InterceptedInput::new();
        let console = ConsoleHandle::new(
            input.injector(),
            ExecuteTemplate::parse("execute as %s run %s").unwrap(),
            Arc::new(Mutex::new(Vec::new())) as SharedWriter,
            Arc::clone(err) as SharedWriter,
        );
        (input, Invoker::server(Arc::new(console)))
    }

    #[test]
    fn test_dispatch_passes_tokens_and_invoker() {
        let runner = Arc::new(RecordingRunner::default());
        let dispatcher = Dispatcher::new(Arc::clone(&runner) as Arc<dyn ScriptRunner>);
        let err = Arc::new(Mutex::new(Vec::new()));
        let (_input, server) = server_invoker(&err);

        assert!(dispatcher.dispatch(&server, "say hi there"));

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "say");
        assert_eq!(calls[0].1, ["say", "hi", "there"]);
        assert_eq!(calls[0].2, None);
        assert!(err.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_reported_exactly_once() {
        let runner = Arc::new(RecordingRunner::default());
        let dispatcher = Dispatcher::new(Arc::clone(&runner) as Arc<dyn ScriptRunner>);
        let err = Arc::new(Mutex::new(Vec::new()));
        let (_input, server) = server_invoker(&err);

        assert!(!dispatcher.dispatch(&server, "boom now"));
        assert_eq!(err.lock().unwrap().as_slice(), b"boom.lua:1: kaboom\n");
    }

    #[test]
    fn test_empty_command_is_script_error() {
        let runner = Arc::new(RecordingRunner::default());
        let dispatcher = Dispatcher::new(Arc::clone(&runner) as Arc<dyn ScriptRunner>);
        let err = Arc::new(Mutex::new(Vec::new()));
        let (_input, server) = server_invoker(&err);

        assert!(!dispatcher.dispatch(&server, "   "));
        assert!(runner.calls.lock().unwrap().is_empty());
        assert_eq!(err.lock().unwrap().as_slice(), b"No script specified\n");
    }

    #[test]
    fn test_worker_runs_requests_in_order() {
        let runner = Arc::new(RecordingRunner::default());
        let err = Arc::new(Mutex::new(Vec::new()));
        let (_input, server) = server_invoker(&err);

        let worker =
            DispatchWorker::spawn(Dispatcher::new(Arc::clone(&runner) as Arc<dyn ScriptRunner>))
                .unwrap();
        let queue = worker.queue();
        queue.submit(server.clone(), "first");
        queue.submit(server.clone(), "boom");
        queue.submit(server, "third");
        drop(worker);

        let names: Vec<String> = runner
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.0.clone())
            .collect();
        assert_eq!(names, ["first", "boom", "third"]);
        assert_eq!(err.lock().unwrap().as_slice(), b"boom.lua:1: kaboom\n");
    }
}
