//! Ordered, synchronous publish/subscribe for lines.
//!
//! The bus does no locking of its own. It is owned by one interception
//! channel and only ever published from the thread currently servicing that
//! channel. `publish` borrows the bus immutably while `subscribe` and
//! `unsubscribe` need `&mut`, so the subscriber list cannot change while a
//! publication is in flight.

use std::sync::Arc;

use super::event::LineEvent;

/// Something that reacts to published lines.
///
/// Implementors receive the event by `&mut` and may call
/// [`LineEvent::cancel`]. A cancellation is visible to every subscriber that
/// runs afterwards during the same publication.
pub trait LineSubscriber: Send + Sync {
    /// Handle one published line.
    fn on_line(&self, event: &mut LineEvent);
}

/// Ordered list of [`LineSubscriber`]s.
///
/// The same subscriber may be registered more than once; each registration
/// is a separate entry and is invoked once per publication. Identity is by
/// reference (the `Arc` allocation), never by value.
#[derive(Default)]
pub struct LineBus {
    subscribers: Vec<Arc<dyn LineSubscriber>>,
}

impl std::fmt::Debug for LineBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineBus")
            .field("subscriber_count", &self.subscribers.len())
            .finish()
    }
}

impl LineBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber to the end of the notification order.
    pub fn subscribe(&mut self, subscriber: Arc<dyn LineSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Remove the first registration of `subscriber`.
    ///
    /// Other registrations of the same subscriber stay in place. Returns
    /// `true` if an entry was removed.
    pub fn unsubscribe<T: LineSubscriber + ?Sized>(&mut self, subscriber: &Arc<T>) -> bool {
        let target = Arc::as_ptr(subscriber).cast::<()>();
        let position = self
            .subscribers
            .iter()
            .position(|s| Arc::as_ptr(s).cast::<()>() == target);

        match position {
            Some(idx) => {
                self.subscribers.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Publish `line` to every subscriber in registration order.
    ///
    /// Returns whether the event ended up cancelled.
    pub fn publish(&self, line: impl Into<String>) -> bool {
        let mut event = LineEvent::new(line);
        for subscriber in &self.subscribers {
            subscriber.on_line(&mut event);
        }
        event.is_cancelled()
    }

    /// Number of registrations, counting duplicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
