//! Background forwarder from the real input source.
//!
//! One long-lived thread reads whole lines from the original input and
//! enqueues them on the input channel. When the source reaches end of stream
//! or fails, the thread logs why and exits; the channel keeps working for
//! injected lines.

// Rust guideline compliant 2026-02

use std::io::{self, BufRead, BufReader, Read};
use std::thread::{self, JoinHandle};

use crate::constants::{is_line_terminator, CR, FORWARDER_THREAD_NAME, LF};

use super::input::LineInjector;

/// Spawn the forwarder thread for `source`.
///
/// Lines may end in LF, CRLF or a lone CR; the terminator is stripped and
/// the bytes are decoded as UTF-8 (invalid sequences replaced).
///
/// # Errors
///
/// Returns an error if the OS refuses to create the thread.
pub fn spawn<R>(source: R, injector: LineInjector) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(FORWARDER_THREAD_NAME.to_string())
        .spawn(move || forward_lines(source, &injector))
}

/// Copy lines from `source` into the queue until it ends or fails.
fn forward_lines<R: Read>(source: R, injector: &LineInjector) {
    log::info!("stdin forwarder started");
    let mut reader = LineReader::new(source);
    let mut buf = Vec::new();

    loop {
        match reader.read_line(&mut buf) {
            Ok(false) => {
                log::info!("stdin reached end of stream, forwarder exiting");
                break;
            }
            Ok(true) => {
                let line = String::from_utf8_lossy(&buf).into_owned();
                if !injector.writeln(line) {
                    log::info!("input channel gone, forwarder exiting");
                    break;
                }
            }
            Err(e) => {
                log::error!("stdin read failed, forwarder exiting: {e}");
                break;
            }
        }
    }
}

/// Splits a byte stream into lines ending in LF, CR or CRLF.
///
/// A CR ends its line immediately, without waiting for the next byte, so an
/// interactive source is never stalled. An LF that directly follows it is
/// skipped on the next call.
struct LineReader<R> {
    inner: BufReader<R>,
    skip_lf: bool,
}

impl<R: Read> LineReader<R> {
    fn new(source: R) -> Self {
        Self {
            inner: BufReader::new(source),
            skip_lf: false,
        }
    }

    /// Read the next line into `line`, without its terminator.
    ///
    /// Returns `false` at end of stream with nothing read. A final line
    /// without a terminator is still returned.
    fn read_line(&mut self, line: &mut Vec<u8>) -> io::Result<bool> {
        line.clear();
        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(!line.is_empty());
            }

            let mut start = 0;
            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == LF {
                    start = 1;
                }
            }

            match available[start..].iter().position(|&b| is_line_terminator(b)) {
                Some(pos) => {
                    let end = start + pos;
                    line.extend_from_slice(&available[start..end]);
                    self.skip_lf = available[end] == CR;
                    self.inner.consume(end + 1);
                    return Ok(true);
                }
                None => {
                    line.extend_from_slice(&available[start..]);
                    let used = available.len();
                    self.inner.consume(used);
                }
            }
        }
    }
}
