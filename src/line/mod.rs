//! Line events and the synchronous line bus.
//!
//! Both interception channels reassemble raw bytes into lines and hand each
//! line to a [`LineBus`]. The bus notifies its [`LineSubscriber`]s in
//! registration order with a single [`LineEvent`] that any subscriber may
//! cancel.
//!
//! # Design Principle: "One event, one publication."
//!
//! A `LineEvent` lives exactly as long as one `publish` call. It is passed
//! by `&mut` to each subscriber in turn and dropped afterwards, so a
//! cancellation can never leak into another line.
//!
//! ```text
//! channel ──publish("say hi")──► LineBus
//!                                 ├── subscriber #1  (may cancel)
//!                                 ├── subscriber #2  (sees cancellation)
//!                                 └── ...
//!                     ◄── cancelled: bool
//! ```

pub mod bus;
pub mod event;

pub use bus::{LineBus, LineSubscriber};
pub use event::LineEvent;
