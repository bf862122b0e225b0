//! The cancellable line event.

/// A single line of text being published on a [`LineBus`](super::LineBus).
///
/// The line text is immutable. The cancelled flag starts `false` and can
/// only move to `true`; there is no way to un-cancel an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    line: String,
    cancelled: bool,
}

impl LineEvent {
    /// Create a new, uncancelled event for `line`.
    #[must_use]
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            cancelled: false,
        }
    }

    /// The line of text, without its terminator.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Mark the event as cancelled.
    ///
    /// On the input channel this keeps the line away from the consumer.
    /// On the output channel it has no effect.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether any subscriber has cancelled this event.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
