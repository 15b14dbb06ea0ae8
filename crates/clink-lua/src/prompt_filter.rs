//! Lua-backed prompt filter (`prompt_filter::filter`): runs the incoming
//! prompt string through a named Lua function and returns whatever string
//! it hands back, or the original prompt unchanged if no filter is
//! installed or the filter errors.

use mlua::Lua;
use tracing::warn;

pub struct PromptFilter {
    lua: Lua,
    function_name: String,
}

impl PromptFilter {
    pub fn new(lua: Lua, function_name: impl Into<String>) -> Self {
        Self { lua, function_name: function_name.into() }
    }

    /// Returns the filtered prompt, or `prompt` verbatim if nothing filtered
    /// it (no function registered, or a script error) — a missing filter
    /// must never blank the prompt.
    pub fn filter(&self, prompt: &str) -> String {
        let func: mlua::Function = match self.lua.globals().get(self.function_name.as_str()) {
            Ok(f) => f,
            Err(_) => return prompt.to_string(),
        };

        match func.call::<Option<String>>(prompt.to_string()) {
            Ok(Some(filtered)) => filtered,
            Ok(None) => prompt.to_string(),
            Err(err) => {
                warn!(target = "lua.prompt_filter", function = %self.function_name, %err, "filter_call_failed");
                prompt.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_transforms_prompt() {
        let lua = Lua::new();
        lua.load(r#"function filter_prompt(p) return p .. " $" end"#).exec().unwrap();
        let filter = PromptFilter::new(lua, "filter_prompt");
        assert_eq!(filter.filter("C:\\>"), "C:\\> $");
    }

    #[test]
    fn missing_filter_returns_prompt_unchanged() {
        let lua = Lua::new();
        let filter = PromptFilter::new(lua, "filter_prompt");
        assert_eq!(filter.filter("C:\\>"), "C:\\>");
    }

    #[test]
    fn filter_returning_nil_keeps_prompt_unchanged() {
        let lua = Lua::new();
        lua.load("function filter_prompt(p) end").exec().unwrap();
        let filter = PromptFilter::new(lua, "filter_prompt");
        assert_eq!(filter.filter("C:\\>"), "C:\\>");
    }
}
