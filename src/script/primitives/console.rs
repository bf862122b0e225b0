//! `console` table for Lua scripts.
//!
//! ```lua
//! console.execute("say building...")   -- injected exactly as written
//! console.sleep(250)                   -- milliseconds
//! ```
//!
//! `console.execute` never applies the player execute template; use
//! `invoker:execute` for commands that should run as the invoking player.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use mlua::Lua;

use crate::console::ConsoleHandle;

/// Register the global `console` table bound to `console`.
pub fn register(lua: &Lua, console: Arc<ConsoleHandle>) -> Result<()> {
    let table = lua
        .create_table()
        .map_err(|e| anyhow!("Failed to create console table: {e}"))?;

    let handle = Arc::clone(&console);
    let execute_fn = lua
        .create_function(move |_, command: String| Ok(handle.execute(&command)))
        .map_err(|e| anyhow!("Failed to create console.execute function: {e}"))?;
    table
        .set("execute", execute_fn)
        .map_err(|e| anyhow!("Failed to set console.execute: {e}"))?;

    let sleep_fn = lua
        .create_function(move |_, millis: u64| {
            console.sleep(millis);
            Ok(())
        })
        .map_err(|e| anyhow!("Failed to create console.sleep function: {e}"))?;
    table
        .set("sleep", sleep_fn)
        .map_err(|e| anyhow!("Failed to set console.sleep: {e}"))?;

    lua.globals()
        .set("console", table)
        .map_err(|e| anyhow!("Failed to register console table globally: {e}"))?;
    Ok(())
}
