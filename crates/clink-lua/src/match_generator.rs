//! Lua-backed match generator (`lua_match_generator.cpp`): calls a named Lua
//! function with the current `line_state` table, and turns whatever it
//! returns into `MatchEntry` values.

use crate::line_state;
use clink_editor::{MatchEntry, MatchFlags};
use clink_match::{GenerateContext, MatchGenerator};
use mlua::{Lua, Table, Value};
use tracing::warn;

/// Calls the Lua global function named `function_name` with a `line_state`
/// table argument; the function should return an array of either plain
/// strings or `{match=, display=, description=, type=}` tables.
pub struct LuaMatchGenerator {
    lua: Lua,
    function_name: String,
}

impl LuaMatchGenerator {
    pub fn new(lua: Lua, function_name: impl Into<String>) -> Self {
        Self { lua, function_name: function_name.into() }
    }

    fn entry_from_value(value: Value) -> Option<MatchEntry> {
        match value {
            Value::String(s) => Some(MatchEntry::simple(s.to_string_lossy())),
            Value::Table(t) => {
                let match_text: String = t.get("match").ok()?;
                let display_text: String = t.get("display").unwrap_or_else(|_| match_text.clone());
                let description: String = t.get("description").unwrap_or_default();
                let type_byte: u8 = t.get("type").unwrap_or(0);
                Some(MatchEntry {
                    match_text,
                    display_text,
                    description: description.clone(),
                    type_byte,
                    append_char: None,
                    flags: MatchFlags { suppress_append_char: false, has_description: !description.is_empty() },
                })
            }
            _ => None,
        }
    }
}

impl MatchGenerator for LuaMatchGenerator {
    fn generate(&self, ctx: &GenerateContext) -> Vec<MatchEntry> {
        let state = match line_state::push(&self.lua, ctx) {
            Ok(t) => t,
            Err(err) => {
                warn!(target = "lua.match_generator", %err, "line_state_build_failed");
                return Vec::new();
            }
        };

        let func: mlua::Function = match self.lua.globals().get(self.function_name.as_str()) {
            Ok(f) => f,
            Err(err) => {
                warn!(target = "lua.match_generator", function = %self.function_name, %err, "generator_function_missing");
                return Vec::new();
            }
        };

        let result: Table = match func.call(state) {
            Ok(t) => t,
            Err(err) => {
                warn!(target = "lua.match_generator", function = %self.function_name, %err, "generator_call_failed");
                return Vec::new();
            }
        };

        result
            .sequence_values::<Value>()
            .filter_map(|v| v.ok())
            .filter_map(Self::entry_from_value)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator_with(script: &str) -> LuaMatchGenerator {
        let lua = Lua::new();
        lua.load(script).exec().unwrap();
        LuaMatchGenerator::new(lua, "generate_matches")
    }

    #[test]
    fn string_results_become_simple_entries() {
        let gen = generator_with(
            r#"
            function generate_matches(state)
                return { "alpha", "beta" }
            end
            "#,
        );
        let ctx = GenerateContext { line: "al", word_start: 0, word_end: 2 };
        let matches = gen.generate(&ctx);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].match_text, "alpha");
    }

    #[test]
    fn table_results_carry_display_and_description() {
        let gen = generator_with(
            r#"
            function generate_matches(state)
                return { { match = "co", display = "checkout", description = "switch branches" } }
            end
            "#,
        );
        let ctx = GenerateContext { line: "co", word_start: 0, word_end: 2 };
        let matches = gen.generate(&ctx);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].display_text, "checkout");
        assert!(matches[0].flags.has_description);
    }

    #[test]
    fn missing_function_yields_no_matches_instead_of_panicking() {
        let gen = generator_with("-- no generator defined");
        let ctx = GenerateContext { line: "x", word_start: 0, word_end: 1 };
        assert!(gen.generate(&ctx).is_empty());
    }
}
