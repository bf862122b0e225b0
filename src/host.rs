//! Runs the wrapped server as a child process between the two channels.
//!
//! The child's stdin is fed from the input channel by the `server-stdin`
//! pump, and its stdout is copied into the output channel by the
//! `server-stdout` pump. Its stderr is inherited untouched.
//!
//! The stdin pump reads the input channel through a `BufReader`; the
//! channel's one-byte reads keep that from running ahead of cancellation.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::config::WrapperConfig;
use crate::constants::{
    LF, STDIN_PUMP_THREAD_NAME, STDOUT_PUMP_THREAD_NAME, SUPERVISE_INTERVAL_MS,
};
use crate::io::{InterceptedInput, InterceptedOutput};

/// A running wrapped server.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    stdout_pump: Option<JoinHandle<()>>,
}

impl ServerProcess {
    /// Start the configured server command wired to `input` and `output`.
    pub fn spawn<W>(
        config: &WrapperConfig,
        input: InterceptedInput,
        output: InterceptedOutput<W>,
    ) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let (program, args) = config.server_program()?;
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &config.server_directory {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to start server: {}", config.server_command.join(" ")))?;
        log::info!(
            "Started server (pid {}): {}",
            child.id(),
            config.server_command.join(" ")
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Server stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Server stdout was not captured"))?;

        // Not joined: it sits in a blocking read on the input channel until
        // the process exits.
        thread::Builder::new()
            .name(STDIN_PUMP_THREAD_NAME.to_string())
            .spawn(move || pump_input(input, stdin))
            .context("Failed to spawn server stdin pump")?;

        let stdout_pump = thread::Builder::new()
            .name(STDOUT_PUMP_THREAD_NAME.to_string())
            .spawn(move || pump_output(stdout, output))
            .context("Failed to spawn server stdout pump")?;

        Ok(Self {
            child,
            stdout_pump: Some(stdout_pump),
        })
    }

    /// OS process id of the server.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Wait for the server to exit, then for its remaining output to drain.
    pub fn wait(mut self) -> Result<ExitStatus> {
        let status = self.child.wait().context("Failed to wait for server")?;
        self.finish(status)
    }

    /// Wait for the server to exit, calling `on_shutdown` once if `shutdown`
    /// gets set first.
    ///
    /// `on_shutdown` is expected to ask the server to stop (for example by
    /// injecting its stop command); the server is never killed.
    pub fn supervise(
        mut self,
        shutdown: &AtomicBool,
        on_shutdown: impl FnOnce(),
    ) -> Result<ExitStatus> {
        let mut on_shutdown = Some(on_shutdown);
        loop {
            if let Some(status) = self.child.try_wait().context("Failed to poll server")? {
                return self.finish(status);
            }
            if shutdown.load(Ordering::Relaxed) {
                if let Some(stop) = on_shutdown.take() {
                    log::info!("Shutdown requested, asking server to stop");
                    stop();
                }
            }
            thread::sleep(Duration::from_millis(SUPERVISE_INTERVAL_MS));
        }
    }

    fn finish(&mut self, status: ExitStatus) -> Result<ExitStatus> {
        log::info!("Server exited: {status}");
        if let Some(pump) = self.stdout_pump.take() {
            if pump.join().is_err() {
                log::error!("Server stdout pump panicked");
            }
        }
        Ok(status)
    }
}

/// Feed whole lines from the input channel to the server's stdin.
fn pump_input(input: InterceptedInput, mut stdin: ChildStdin) {
    let mut reader = BufReader::new(input);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(LF, &mut line) {
            Ok(0) => {
                log::info!("Input channel ended, closing server stdin");
                break;
            }
            Ok(_) => {
                if let Err(e) = stdin.write_all(&line).and_then(|()| stdin.flush()) {
                    log::info!("Server stdin closed: {e}");
                    break;
                }
            }
            Err(e) => {
                log::error!("Input channel read failed: {e}");
                break;
            }
        }
    }
}

/// Copy the server's stdout into the output channel until it closes.
fn pump_output<W: Write>(mut stdout: ChildStdout, mut output: InterceptedOutput<W>) {
    let result = io::copy(&mut stdout, &mut output).and_then(|_| output.flush());
    match result {
        Ok(()) => log::info!("Server stdout closed"),
        Err(e) => log::error!("Server stdout pump failed: {e}"),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::line::{LineEvent, LineSubscriber};
    use std::sync::{Arc, Mutex};

    struct Collect(Mutex<Vec<String>>);

    impl LineSubscriber for Collect {
        fn on_line(&self, event: &mut LineEvent) {
            self.0.lock().unwrap().push(event.line().to_string());
        }
    }

    fn config_for(command: &[&str]) -> WrapperConfig {
        WrapperConfig {
            server_command: command.iter().map(|s| (*s).to_string()).collect(),
            ..WrapperConfig::default()
        }
    }

    #[test]
    fn test_round_trip_through_child() {
        let input = InterceptedInput::new();
        let injector = input.injector();
        let collect = Arc::new(Collect(Mutex::new(Vec::new())));
        let mut output = InterceptedOutput::new(Vec::new());
        output.subscribe(Arc::clone(&collect) as Arc<dyn LineSubscriber>);

        // `head -n 2` echoes two lines then exits.
        let server = ServerProcess::spawn(&config_for(&["head", "-n", "2"]), input, output).unwrap();
        injector.writeln("first");
        injector.writeln("second");

        let status = server.wait().unwrap();
        assert!(status.success());
        assert_eq!(*collect.0.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_exit_code_is_reported() {
        let server = ServerProcess::spawn(
            &config_for(&["sh", "-c", "exit 3"]),
            InterceptedInput::new(),
            InterceptedOutput::new(Vec::new()),
        )
        .unwrap();
        assert_eq!(server.wait().unwrap().code(), Some(3));
    }

    #[test]
    fn test_supervise_sends_stop_once_on_shutdown() {
        let input = InterceptedInput::new();
        let injector = input.injector();
        let collect = Arc::new(Collect(Mutex::new(Vec::new())));
        let mut output = InterceptedOutput::new(Vec::new());
        output.subscribe(Arc::clone(&collect) as Arc<dyn LineSubscriber>);

        // Echo lines until "stop" arrives.
        let script = "while read line; do echo \"$line\"; [ \"$line\" = stop ] && exit 0; done";
        let server = ServerProcess::spawn(&config_for(&["sh", "-c", script]), input, output).unwrap();

        let shutdown = AtomicBool::new(true);
        let status = server
            .supervise(&shutdown, || {
                injector.writeln("stop");
            })
            .unwrap();

        assert!(status.success());
        assert_eq!(*collect.0.lock().unwrap(), vec!["stop"]);
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let result = ServerProcess::spawn(
            &config_for(&["/definitely/not/a/server"]),
            InterceptedInput::new(),
            InterceptedOutput::new(Vec::new()),
        );
        assert!(result.is_err());
    }
}
