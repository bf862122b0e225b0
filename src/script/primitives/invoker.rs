//! `invoker` userdata for Lua scripts.
//!
//! ```lua
//! if invoker:is_server() then
//!   invoker:print("run from the console")
//! else
//!   invoker:print_colored("hello " .. invoker.name, "gold")
//!   invoker:execute("tp ~ ~10 ~")   -- runs as the player
//!   invoker:tellraw('{"text":"boom","bold":true}')
//! end
//! ```

use anyhow::{anyhow, Result};
use mlua::prelude::*;

use crate::invoker::Invoker;

/// Lua view of an [`Invoker`].
#[derive(Debug, Clone)]
pub struct LuaInvoker(Invoker);

impl LuaUserData for LuaInvoker {
    fn add_fields<F: LuaUserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("name", |_, this| Ok(this.0.name().map(str::to_string)));
    }

    fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("is_server", |_, this, ()| Ok(this.0.is_server()));

        methods.add_method("execute", |_, this, command: String| {
            Ok(this.0.execute(&command))
        });

        methods.add_method("print", |_, this, message: String| Ok(this.0.print(&message)));

        methods.add_method("print_error", |_, this, message: String| {
            Ok(this.0.print_error(&message))
        });

        methods.add_method(
            "print_colored",
            |_, this, (message, color): (String, String)| Ok(this.0.print_colored(&message, &color)),
        );

        // nil for the server console.
        methods.add_method("tellraw", |_, this, json: String| Ok(this.0.tellraw(&json)));
    }
}

/// Register the global `invoker`.
pub fn register(lua: &Lua, invoker: Invoker) -> Result<()> {
    lua.globals()
        .set("invoker", LuaInvoker(invoker))
        .map_err(|e| anyhow!("Failed to register invoker globally: {e}"))?;
    Ok(())
}
