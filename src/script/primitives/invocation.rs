//! `args` and `command` globals.
//!
//! `args[0]` is the script name and `args[1]` onwards are the arguments, so
//! `#args` is the argument count. `command` is the full command text.

use anyhow::{anyhow, Result};
use mlua::Lua;

use crate::script::ScriptInvocation;

/// Register `args` and `command` for `invocation`.
pub fn register(lua: &Lua, invocation: &ScriptInvocation) -> Result<()> {
    let args = lua
        .create_table()
        .map_err(|e| anyhow!("Failed to create args table: {e}"))?;
    for (index, token) in invocation.args().iter().enumerate() {
        args.raw_set(index, token.as_str())
            .map_err(|e| anyhow!("Failed to set args[{index}]: {e}"))?;
    }

    let globals = lua.globals();
    globals
        .set("args", args)
        .map_err(|e| anyhow!("Failed to register args globally: {e}"))?;
    globals
        .set("command", invocation.command())
        .map_err(|e| anyhow!("Failed to register command globally: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_are_zero_indexed_from_script_name() {
        let lua = Lua::new();
        let invocation = ScriptInvocation::parse("triangle 1 2 3").unwrap();
        register(&lua, &invocation).unwrap();

        let (name, first, count, command): (String, String, i64, String) = lua
            .load("return args[0], args[1], #args, command")
            .eval()
            .unwrap();
        assert_eq!(name, "triangle");
        assert_eq!(first, "1");
        assert_eq!(count, 3);
        assert_eq!(command, "triangle 1 2 3");
    }

    #[test]
    fn test_no_arguments() {
        let lua = Lua::new();
        register(&lua, &ScriptInvocation::parse("hello").unwrap()).unwrap();
        let count: i64 = lua.load("return #args").eval().unwrap();
        assert_eq!(count, 0);
    }
}
