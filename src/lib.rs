//! craftwrap - console wrapper for line-oriented game servers.
//!
//! craftwrap sits between an operator's terminal and a server process such
//! as a Minecraft dedicated server. Every line typed into the console and
//! every line the server prints is published to subscribers, which may
//! cancel input lines before the server sees them. The shipped subscribers
//! turn trigger lines into Lua script runs.
//!
//! # Architecture
//!
//! - **Line bus** - ordered synchronous publish/subscribe with cancellation
//! - **Channels** - instrumented stdin ([`InterceptedInput`]) and stdout
//!   ([`InterceptedOutput`]), each with its own bus
//! - **Console** - input/output triggers, the dispatch worker and invokers
//! - **Scripts** - the [`ScriptRunner`] seam and its Lua implementation
//! - **Host** - runs the server as a child process between the channels
//!
//! # Modules
//!
//! - [`line`] - Line events and the line bus
//! - [`io`] - Interception channels and process-wide stream ownership
//! - [`console`] - Triggers, dispatch and the shared console handle
//! - [`invoker`] - Server and player invokers
//! - [`script`] - Script invocation and the Lua runner
//! - [`config`] - Configuration loading and validation
//! - [`host`] - Child process harness

pub mod config;
pub mod console;
pub mod constants;
pub mod host;
pub mod invoker;
pub mod io;
pub mod line;
pub mod script;

// Re-export commonly used types
pub use config::{ConfigError, TriggerConfig, WrapperConfig};
pub use console::Console;
pub use host::ServerProcess;
pub use invoker::{Invoker, InvokerKind};
pub use io::{InterceptedInput, InterceptedOutput, LineInjector, StandardStreams};
pub use line::{LineBus, LineEvent, LineSubscriber};
pub use script::{LuaScriptRunner, ScriptError, ScriptInvocation, ScriptRunner};
