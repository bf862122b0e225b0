//! `log` table for Lua scripts.
//!
//! ```lua
//! log.info("building ellipsoid at " .. args[1])
//! log.warn("radius clamped")
//! ```
//!
//! Messages go through the `log` crate under the `lua` target, so they land
//! in the same log file as everything else and obey the same filters.

use anyhow::{anyhow, Result};
use mlua::Lua;

/// Lua function names and the level each one logs at.
const LEVELS: [(&str, log::Level); 4] = [
    ("error", log::Level::Error),
    ("warn", log::Level::Warn),
    ("info", log::Level::Info),
    ("debug", log::Level::Debug),
];

/// Register the global `log` table.
pub fn register(lua: &Lua) -> Result<()> {
    let table = lua
        .create_table()
        .map_err(|e| anyhow!("Failed to create log table: {e}"))?;

    for (name, level) in LEVELS {
        let log_fn = lua
            .create_function(move |_, msg: String| {
                log::log!(target: "lua", level, "{msg}");
                Ok(())
            })
            .map_err(|e| anyhow!("Failed to create log.{name} function: {e}"))?;
        table
            .set(name, log_fn)
            .map_err(|e| anyhow!("Failed to set log.{name}: {e}"))?;
    }

    lua.globals()
        .set("log", table)
        .map_err(|e| anyhow!("Failed to register log table globally: {e}"))?;
    Ok(())
}
