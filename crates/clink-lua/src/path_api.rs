//! The `path.*` Lua table (`path_lua_api.cpp`): `clean`, `getbasename`,
//! `getdirectory`, `getdrive`, `getextension`, `getname`, `join`. Built on
//! `clink_text::path`'s split/join/normalise primitives plus the small
//! amount of component-picking logic the original adds on top of them.

use clink_text::path;
use mlua::{Lua, Result as LuaResult, Table};

fn get_drive(p: &str) -> Option<String> {
    let bytes = p.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' {
        Some(p[..2].to_string())
    } else {
        None
    }
}

fn get_directory(p: &str) -> Option<String> {
    let parts = path::split(p);
    if parts.len() <= 1 {
        return None;
    }
    Some(path::join(&parts[..parts.len() - 1]))
}

fn get_name(p: &str) -> String {
    path::split(p).last().map(|s| s.to_string()).unwrap_or_default()
}

fn get_extension(p: &str) -> String {
    let name = get_name(p);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_string(),
        _ => String::new(),
    }
}

fn get_base_name(p: &str) -> String {
    let name = get_name(p);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name,
    }
}

/// Registers the `path` global table on `lua`, mirroring
/// `path_lua_api::initialise`.
pub fn install(lua: &Lua) -> LuaResult<()> {
    let table = lua.create_table()?;

    table.set(
        "clean",
        lua.create_function(|_, (p, _sep): (String, Option<String>)| Ok(path::normalise(&p)))?,
    )?;
    table.set("getbasename", lua.create_function(|_, p: String| Ok(get_base_name(&p)))?)?;
    table.set("getdirectory", lua.create_function(|_, p: String| Ok(get_directory(&p)))?)?;
    table.set("getdrive", lua.create_function(|_, p: String| Ok(get_drive(&p)))?)?;
    table.set("getextension", lua.create_function(|_, p: String| Ok(get_extension(&p)))?)?;
    table.set("getname", lua.create_function(|_, p: String| Ok(get_name(&p)))?)?;
    table.set(
        "join",
        lua.create_function(|_, (lhs, rhs): (String, String)| Ok(path::join(&[&lhs, &rhs])))?,
    )?;

    lua.globals().set("path", table)?;
    Ok(())
}

/// Fetches the `path` global as a table, for callers that want to invoke it
/// directly rather than re-running a script that references it.
pub fn table(lua: &Lua) -> LuaResult<Table> {
    lua.globals().get("path")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_helpers_match_original_semantics() {
        assert_eq!(get_drive(r"C:\Windows"), Some("C:".to_string()));
        assert_eq!(get_drive("relative"), None);
        assert_eq!(get_directory(r"C:\Windows\System32"), Some(r"C:\Windows".to_string()));
        assert_eq!(get_name(r"C:\Windows\System32\cmd.exe"), "cmd.exe");
        assert_eq!(get_extension("cmd.exe"), ".exe");
        assert_eq!(get_base_name("cmd.exe"), "cmd");
        assert_eq!(get_extension("noext"), "");
    }

    #[test]
    fn installed_table_is_callable_from_lua() {
        let lua = Lua::new();
        install(&lua).unwrap();
        let result: String = lua
            .load(r#"return path.join("C:\\foo", "bar.txt")"#)
            .eval()
            .unwrap();
        assert_eq!(result, r"C:\foo\bar.txt");

        let ext: String = lua.load(r#"return path.getextension("a.b.rs")"#).eval().unwrap();
        assert_eq!(ext, ".rs");
    }
}
