//! One real output destination shared by the server and the console.
//!
//! The server's stdout arrives in arbitrary chunks, so at any moment the
//! destination may hold half of a server line. [`SharedOutput`] hands out
//! two writers over the same destination: a [`ServerWriter`] for the output
//! channel and a [`MessageWriter`] for console messages. A message written
//! while the server is part-way through a line is held back and written as
//! soon as that line ends.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::constants::is_line_terminator;

struct State<W> {
    out: W,
    /// The server has written part of a line that has not ended yet.
    mid_line: bool,
    /// Message bytes waiting for the server's line to end.
    held: Vec<u8>,
}

impl<W: Write> State<W> {
    fn release_held(&mut self) -> io::Result<()> {
        if self.held.is_empty() {
            return Ok(());
        }
        let held = std::mem::take(&mut self.held);
        self.out.write_all(&held)?;
        self.out.flush()
    }
}

/// A destination shared between a [`ServerWriter`] and any number of
/// [`MessageWriter`]s.
pub struct SharedOutput<W> {
    state: Arc<Mutex<State<W>>>,
}

impl<W> Clone for SharedOutput<W> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<W> std::fmt::Debug for SharedOutput<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedOutput").finish_non_exhaustive()
    }
}

impl<W: Write> SharedOutput<W> {
    /// Share `out`.
    pub fn new(out: W) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                out,
                mid_line: false,
                held: Vec::new(),
            })),
        }
    }

    /// Writer for the server's byte stream.
    pub fn server_writer(&self) -> ServerWriter<W> {
        ServerWriter {
            shared: self.clone(),
        }
    }

    /// Writer for console messages.
    ///
    /// Each `write` call is kept whole; write a complete line per call.
    pub fn message_writer(&self) -> MessageWriter<W> {
        MessageWriter {
            shared: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The server side of a [`SharedOutput`].
///
/// Dropping it releases any held messages, so nothing is lost when the
/// server stops halfway through a line.
#[derive(Debug)]
pub struct ServerWriter<W: Write> {
    shared: SharedOutput<W>,
}

impl<W: Write> Write for ServerWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(&last) = buf.last() else {
            return Ok(0);
        };
        let mut state = self.shared.lock();
        state.out.write_all(buf)?;
        state.mid_line = !is_line_terminator(last);
        if !state.mid_line {
            state.out.flush()?;
            state.release_held()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.shared.lock().out.flush()
    }
}

impl<W: Write> Drop for ServerWriter<W> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.mid_line = false;
        if let Err(e) = state.release_held() {
            log::warn!("Failed to write held console messages: {e}");
        }
    }
}

/// The console side of a [`SharedOutput`].
#[derive(Debug)]
pub struct MessageWriter<W> {
    shared: SharedOutput<W>,
}

impl<W: Write> Write for MessageWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.shared.lock();
        if state.mid_line {
            state.held.extend_from_slice(buf);
        } else {
            state.out.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.shared.lock();
        if state.mid_line {
            Ok(())
        } else {
            state.out.flush()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(shared: &SharedOutput<Vec<u8>>) -> String {
        String::from_utf8(shared.lock().out.clone()).unwrap()
    }

    #[test]
    fn test_message_between_lines_goes_straight_out() {
        let shared = SharedOutput::new(Vec::new());
        let mut server = shared.server_writer();
        let mut messages = shared.message_writer();

        server.write_all(b"[INFO] Done\n").unwrap();
        messages.write_all(b"script says hi\n").unwrap();

        assert_eq!(contents(&shared), "[INFO] Done\nscript says hi\n");
    }

    #[test]
    fn test_message_waits_for_server_line_to_end() {
        let shared = SharedOutput::new(Vec::new());
        let mut server = shared.server_writer();
        let mut messages = shared.message_writer();

        server.write_all(b"[INFO] Prep").unwrap();
        messages.write_all(b"script says hi\n").unwrap();
        assert_eq!(contents(&shared), "[INFO] Prep");

        server.write_all(b"aring spawn\r\n[INFO] Done\n").unwrap();
        assert_eq!(
            contents(&shared),
            "[INFO] Preparing spawn\r\n[INFO] Done\nscript says hi\n"
        );
    }

    #[test]
    fn test_held_messages_released_when_server_writer_dropped() {
        let shared = SharedOutput::new(Vec::new());
        let mut server = shared.server_writer();
        let mut messages = shared.message_writer();

        server.write_all(b"> ").unwrap();
        messages.write_all(b"bye\n").unwrap();
        drop(server);

        assert_eq!(contents(&shared), "> bye\n");
        messages.write_all(b"after\n").unwrap();
        assert_eq!(contents(&shared), "> bye\nafter\n");
    }
}
