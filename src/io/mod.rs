//! Instrumented standard I/O channels.
//!
//! # Architecture
//!
//! ```text
//! real stdin ──► forwarder thread ──► pending queue ◄── LineInjector (scripts, invokers)
//!                                          │
//!                                          ▼
//!                              InterceptedInput (publish, maybe cancel)
//!                                          │  one byte per read
//!                                          ▼
//!                                   wrapped process
//!                                          │
//!                                          ▼
//!                              InterceptedOutput (forward, then publish)
//!                                          │
//!                                          ▼
//!                                     real stdout ◄── MessageWriter (console prints)
//! ```
//!
//! Each direction is an independent pipeline with its own [`LineBus`](crate::line::LineBus).
//! Nothing orders lines across the two.

pub mod forwarder;
pub mod input;
pub mod output;
pub mod shared;
pub mod streams;

pub use input::{InterceptedInput, LineInjector};
pub use output::InterceptedOutput;
pub use shared::{MessageWriter, ServerWriter, SharedOutput};
pub use streams::{StandardStreams, StreamsError};
