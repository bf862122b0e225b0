//! Globals exposed to Lua scripts.
//!
//! # Available Primitives
//!
//! - `log` - Logging functions (info, warn, error, debug)
//! - `console` - Raw command injection and sleeping
//! - `invoker` - The issuer of the command (userdata)
//! - `args`, `command` - The parsed invocation
//!
//! Every run gets a fresh Lua state, so nothing registered here survives
//! from one script run to the next.

pub mod console;
pub mod invocation;
pub mod invoker;
pub mod log;

use std::sync::Arc;

use anyhow::Result;
use mlua::Lua;

use crate::invoker::Invoker;
use crate::script::ScriptInvocation;

/// Register every primitive for one script run.
pub fn register_all(lua: &Lua, invocation: &ScriptInvocation, invoker: &Invoker) -> Result<()> {
    log::register(lua)?;
    console::register(lua, Arc::clone(invoker.console()))?;
    invoker::register(lua, invoker.clone())?;
    invocation::register(lua, invocation)?;
    Ok(())
}
