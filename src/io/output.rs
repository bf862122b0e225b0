//! Output interception channel.
//!
//! [`InterceptedOutput`] sits in front of the real output destination. Every
//! byte written to it is forwarded unchanged, in order, before the channel
//! looks at it. Non-terminator bytes accumulate into a line buffer; a CR or
//! LF flushes a non-empty buffer through the [`LineBus`].
//!
//! Cancelling an event published here does nothing: by the time subscribers
//! run, the bytes have already gone downstream.

use std::io::{self, Write};
use std::sync::Arc;

use crate::constants::is_line_terminator;
use crate::line::{LineBus, LineSubscriber};

/// Transparent pass-through writer that also publishes complete lines.
pub struct InterceptedOutput<W: Write> {
    /// The destination every byte is forwarded to.
    original: W,
    /// Bytes of the line currently being accumulated.
    buffer: Vec<u8>,
    /// Subscribers notified for each complete line.
    bus: LineBus,
}

impl<W: Write> std::fmt::Debug for InterceptedOutput<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptedOutput")
            .field("buffered_bytes", &self.buffer.len())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl<W: Write> InterceptedOutput<W> {
    /// Wrap `original`; nothing is subscribed yet.
    pub fn new(original: W) -> Self {
        Self {
            original,
            buffer: Vec::new(),
            bus: LineBus::new(),
        }
    }

    /// Register a subscriber for lines written through this channel.
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

    /// Bytes of the line accumulated so far (no terminator seen yet).
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Borrow the original destination.
    pub fn get_ref(&self) -> &W {
        &self.original
    }

    /// Unwrap the original destination, dropping any partial line.
    pub fn into_inner(self) -> W {
        self.original
    }

    /// Publish the accumulated line, if any, and reset the buffer.
    fn emit_line(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        log::trace!("output line: {}", line);
        // Nothing left to suppress: the bytes are already downstream.
        let _cancelled = self.bus.publish(line);
    }
}

impl<W: Write> Write for InterceptedOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (idx, &byte) in buf.iter().enumerate() {
            if is_line_terminator(byte) {
                // Everything up to and including the terminator goes out
                // before the line is published.
                self.original.write_all(&buf[start..=idx])?;
                self.buffer.extend_from_slice(&buf[start..idx]);
                start = idx + 1;
                self.emit_line();
            }
        }

        let rest = &buf[start..];
        if !rest.is_empty() {
            self.original.write_all(rest)?;
            self.buffer.extend_from_slice(rest);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.original.flush()
    }
}
