//! Lua script runner.
//!
//! A script named `foo` lives at `<directory>/foo<extension>`. Each run
//! creates a fresh Lua state, registers the primitives for that invocation
//! (see [`super::primitives`]) and executes the file top to bottom. A Lua
//! error becomes [`ScriptError::Runtime`] with the chunk name and line, e.g.
//! `scripts/foo.lua:3: attempt to call a nil value`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use mlua::Lua;

use crate::invoker::Invoker;

use super::primitives;
use super::{ScriptError, ScriptInvocation, ScriptRunner};

/// Runs `.lua` files from a script directory.
#[derive(Debug, Clone)]
pub struct LuaScriptRunner {
    directory: PathBuf,
    extension: String,
}

impl LuaScriptRunner {
    /// Look scripts up in `directory` with file `extension` (dot included).
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    /// Directory scripts are loaded from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File path for the script `name`.
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}{}", self.extension))
    }

    fn load_source(&self, name: &str) -> Result<(PathBuf, String), ScriptError> {
        let path = self.script_path(name);
        match fs::read_to_string(&path) {
            Ok(source) => Ok((path, source)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ScriptError::NotFound {
                name: name.to_string(),
                path,
            }),
            Err(source) => Err(ScriptError::Io { path, source }),
        }
    }
}

impl ScriptRunner for LuaScriptRunner {
    fn run(&self, invocation: &ScriptInvocation, invoker: &Invoker) -> Result<(), ScriptError> {
        let (path, source) = self.load_source(invocation.script())?;

        let lua = Lua::new();
        primitives::register_all(&lua, invocation, invoker)
            .map_err(|e| ScriptError::Setup(format!("{e:#}")))?;

        lua.load(source)
            .set_name(format!("@{}", path.display()))
            .exec()
            .map_err(|e| ScriptError::Runtime(lua_error_message(&e)))?;

        log::debug!("Script {} finished", path.display());
        Ok(())
    }
}

/// The message a player should see for a Lua error.
///
/// Callback errors wrap the interesting part; unwrap to it and drop the
/// traceback.
fn lua_error_message(error: &mlua::Error) -> String {
    match error {
        mlua::Error::CallbackError { cause, .. } => lua_error_message(cause),
        mlua::Error::RuntimeError(message) | mlua::Error::SyntaxError { message, .. } => message
            .split("\nstack traceback:")
            .next()
            .unwrap_or(message)
            .to_string(),
        other => other.to_string(),
    }
}
