//! Builds the `line_state` table handed to a Lua match generator or prompt
//! filter, mirroring `lua_match_generator::lua_pushlinestate` pushing the
//! current line/word onto the Lua stack as a single argument table rather
//! than several loose parameters.

use clink_match::GenerateContext;
use mlua::{Lua, Result as LuaResult, Table};

/// Builds a table with `line`, `cursor`, `word`, `word_start`, `word_end`
/// (1-based, Lua convention) fields for `ctx`.
pub fn push(lua: &Lua, ctx: &GenerateContext) -> LuaResult<Table> {
    let table = lua.create_table()?;
    table.set("line", ctx.line)?;
    table.set("cursor", ctx.word_end + 1)?;
    table.set("word", ctx.word())?;
    table.set("word_start", ctx.word_start + 1)?;
    table.set("word_end", ctx.word_end)?;
    Ok(table)
}
