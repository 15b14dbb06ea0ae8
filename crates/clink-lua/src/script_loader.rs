//! Script directory loader. Grounded on `lua_script_loader.cpp`: load every
//! `*.lua` file found, log and skip (never abort) on a script that fails to
//! parse or run, since one broken script shouldn't take the whole session
//! down.

use anyhow::{Context, Result};
use mlua::Lua;
use std::path::Path;
use tracing::warn;

/// Loads and executes every `.lua` file directly inside `dir`, in
/// directory-listing order. Returns the count of scripts that loaded
/// cleanly; a failing script is logged and skipped rather than propagated,
/// matching the original loader's "puts the error, keep going" behaviour.
pub fn load_scripts_from_dir(lua: &Lua, dir: &Path) -> Result<usize> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading script directory {}", dir.display()))?;

    let mut loaded = 0;
    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.extension().and_then(|e| e.to_str()) != Some("lua") {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(source) => match lua.load(&source).set_name(path.to_string_lossy().to_string()).exec() {
                Ok(()) => loaded += 1,
                Err(err) => warn!(target = "lua.script_loader", path = %path.display(), %err, "script_failed"),
            },
            Err(err) => warn!(target = "lua.script_loader", path = %path.display(), %err, "script_unreadable"),
        }
    }

    Ok(loaded)
}
