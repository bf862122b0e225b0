//! Input interception channel.
//!
//! [`InterceptedInput`] replaces the wrapped process's standard input. Lines
//! arrive on an unbounded FIFO queue from two kinds of producers:
//!
//! - the stdin forwarder thread (see [`super::forwarder`]), copying lines
//!   from the real input source;
//! - any [`LineInjector`] clone, feeding commands programmatically.
//!
//! The consumer reads bytes. When the current line is used up, the channel
//! blocks on the queue, publishes the next line on its [`LineBus`] and, unless
//! a subscriber cancelled it, serves that line's bytes followed by the
//! platform line separator. Cancelled lines are dropped and the next one is
//! tried immediately.
//!
//! # One Byte Per Read
//!
//! `read` never returns more than one byte. Line-buffered readers stacked on
//! top would otherwise pull bytes of the following line before its
//! subscribers had a chance to cancel it.

use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::constants::LINE_SEPARATOR;
use crate::line::{LineBus, LineSubscriber};

use super::forwarder;

/// Cloneable handle that enqueues lines onto an input channel.
///
/// This is how operator and script commands are fed back into the same
/// pipeline the wrapped process reads from.
#[derive(Debug, Clone)]
pub struct LineInjector {
    tx: Sender<String>,
}

impl LineInjector {
    /// Enqueue `line` (without terminator) behind any lines already pending.
    ///
    /// Returns `false` if the input channel no longer exists.
    pub fn writeln(&self, line: impl Into<String>) -> bool {
        let line = line.into();
        match self.tx.send(line) {
            Ok(()) => true,
            Err(mpsc::SendError(line)) => {
                log::warn!("Input channel closed, dropping line: {}", line);
                false
            }
        }
    }
}

/// Instrumented replacement for standard input.
pub struct InterceptedInput {
    /// Pending whole lines, oldest first.
    pending: Receiver<String>,
    /// Keeps the queue open for as long as the channel exists.
    injector: LineInjector,
    /// Bytes of the line currently being served, separator included.
    serving: Vec<u8>,
    /// Next unread position in `serving`.
    cursor: usize,
    /// Subscribers that may cancel a line before it is served.
    bus: LineBus,
}

impl std::fmt::Debug for InterceptedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptedInput")
            .field("remaining_bytes", &(self.serving.len() - self.cursor))
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl Default for InterceptedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptedInput {
    /// Create a channel fed only by injected lines.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            pending: rx,
            injector: LineInjector { tx },
            serving: Vec::new(),
            cursor: 0,
            bus: LineBus::new(),
        }
    }

    /// Create a channel and start forwarding lines from `source` into it.
    ///
    /// Returns the channel together with the forwarder's join handle. The
    /// forwarder exits on its own when `source` ends or fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the forwarder thread cannot be spawned.
    pub fn with_source<R>(source: R) -> io::Result<(Self, JoinHandle<()>)>
    where
        R: Read + Send + 'static,
    {
        let input = Self::new();
        let handle = forwarder::spawn(source, input.injector())?;
        Ok((input, handle))
    }

    /// A new handle for injecting lines into this channel.
    #[must_use]
    pub fn injector(&self) -> LineInjector {
        self.injector.clone()
    }

    /// Enqueue `line` as if it had been typed on the real input.
    pub fn writeln(&self, line: impl Into<String>) -> bool {
        self.injector.writeln(line)
    }

    /// Register a subscriber for lines passing through this channel.
    pub fn subscribe(&mut self, subscriber: Arc<dyn LineSubscriber>) {
        self.bus.subscribe(subscriber);
    }

    /// Remove the first registration of `subscriber`.
    pub fn unsubscribe<T: LineSubscriber + ?Sized>(&mut self, subscriber: &Arc<T>) -> bool {
        self.bus.unsubscribe(subscriber)
    }

    /// The line bus this channel publishes on.
    pub fn bus(&self) -> &LineBus {
        &self.bus
    }

    /// Read one byte, blocking until an uncancelled line is available.
    ///
    /// Returns `None` only if every producer, including the channel's own
    /// injector, is gone, which cannot happen while `self` is alive.
    pub fn read_byte(&mut self) -> Option<u8> {
        if let Some(&byte) = self.serving.get(self.cursor) {
            self.cursor += 1;
            return Some(byte);
        }

        loop {
            let Ok(line) = self.pending.recv() else {
                return None;
            };

            if self.bus.publish(line.as_str()) {
                log::debug!("input line cancelled: {}", line);
                continue;
            }

            let mut bytes = line.into_bytes();
            bytes.extend_from_slice(LINE_SEPARATOR.as_bytes());
            self.serving = bytes;
            self.cursor = 1;
            return self.serving.first().copied();
        }
    }

    /// Read at most one byte into `buf[offset..offset + len]`.
    ///
    /// A zero `len` returns `Ok(0)` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] if the range does not fit in
    /// `buf`.
    pub fn read_range(&mut self, buf: &mut [u8], offset: usize, len: usize) -> io::Result<usize> {
        let in_bounds = offset
            .checked_add(len)
            .is_some_and(|end| end <= buf.len());
        if !in_bounds {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "range {}..{}+{} out of bounds for buffer of {}",
                    offset,
                    offset,
                    len,
                    buf.len()
                ),
            ));
        }
        if len == 0 {
            return Ok(0);
        }

        match self.read_byte() {
            Some(byte) => {
                buf[offset] = byte;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

impl Read for InterceptedInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        self.read_range(buf, 0, len)
    }
}
