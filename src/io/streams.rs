//! Process-scoped ownership of the real standard streams.
//!
//! The real stdin and stdout are a single resource per process.
//! [`StandardStreams::acquire`] takes them exactly once: it starts the stdin
//! forwarder and wraps stdout in an [`InterceptedOutput`]. Console messages
//! reach the same stdout through [`StandardStreams::message_writer`], which
//! keeps them from splitting a server line. Any later call
//! fails with [`StreamsError::AlreadyAcquired`]. There is no way to put the
//! streams back; the instrumented channels own them until the process exits.
//!
//! The rest of the crate never touches `std::io::stdin()` for the wrapped
//! pipeline; it only sees the two channel values handed out here.

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use thiserror::Error;

use super::input::InterceptedInput;
use super::output::InterceptedOutput;
use super::shared::{MessageWriter, ServerWriter, SharedOutput};

/// Set once the streams have been handed out.
static ACQUIRED: AtomicBool = AtomicBool::new(false);

/// Errors from acquiring the process's standard streams.
#[derive(Debug, Error)]
pub enum StreamsError {
    /// The streams were already acquired earlier in this process.
    #[error("standard streams are already acquired by this process")]
    AlreadyAcquired,
    /// The stdin forwarder thread could not be started.
    #[error("failed to start stdin forwarder: {0}")]
    Forwarder(#[source] io::Error),
}

/// The instrumented stdin and stdout of this process.
#[derive(Debug)]
pub struct StandardStreams {
    input: InterceptedInput,
    output: InterceptedOutput<ServerWriter<Stdout>>,
    stdout: SharedOutput<Stdout>,
    forwarder: JoinHandle<()>,
}

impl StandardStreams {
    /// Take ownership of the process's stdin and stdout.
    ///
    /// # Errors
    ///
    /// Fails if called more than once per process, or if the forwarder
    /// thread cannot be spawned.
    pub fn acquire() -> Result<Self, StreamsError> {
        if ACQUIRED.swap(true, Ordering::SeqCst) {
            return Err(StreamsError::AlreadyAcquired);
        }

        let (input, forwarder) =
            InterceptedInput::with_source(io::stdin()).map_err(StreamsError::Forwarder)?;
        let stdout = SharedOutput::new(io::stdout());
        let output = InterceptedOutput::new(stdout.server_writer());
        log::info!("standard streams acquired");

        Ok(Self {
            input,
            output,
            stdout,
            forwarder,
        })
    }

    /// The instrumented input channel.
    pub fn input_mut(&mut self) -> &mut InterceptedInput {
        &mut self.input
    }

    /// The instrumented output channel.
    pub fn output_mut(&mut self) -> &mut InterceptedOutput<ServerWriter<Stdout>> {
        &mut self.output
    }

    /// A writer for console messages on the real stdout.
    pub fn message_writer(&self) -> MessageWriter<Stdout> {
        self.stdout.message_writer()
    }

    /// Whether the stdin forwarder is still running.
    pub fn forwarder_running(&self) -> bool {
        !self.forwarder.is_finished()
    }

    /// Split into the two channels so each can move to its own thread.
    ///
    /// The forwarder keeps running detached.
    pub fn into_channels(self) -> (InterceptedInput, InterceptedOutput<ServerWriter<Stdout>>) {
        (self.input, self.output)
    }
}
