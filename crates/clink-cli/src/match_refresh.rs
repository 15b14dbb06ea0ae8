//! Bin-local glue module: populates `ctx.matches` before `ClassicMatchUi`
//! sees the same Tab press. `ClassicMatchUi` only ever inspects the match
//! set already sitting in the editor context — nothing in `clink-match`
//! itself calls a generator — so something ahead of it in the module list
//! has to run one. Bound on the same "\t" chord and always returns `Next`
//! so `ClassicMatchUi`'s own Tab handling still runs afterward.

use clink_editor::{EditorContext, EditorModule, MatchEntry, ModuleResult, ResolvedInput};
use clink_keymap::{Binder, BinderError, GroupId};
use clink_match::{FileGenerator, GenerateContext, MatchGenerator};
use clink_text::WildFlags;

const TAB_ID: u8 = 1;

/// Finds the word under the cursor: the run of non-whitespace bytes ending
/// at the cursor. Matches the word-boundary convention `clink-lua`'s
/// `line_state` table and `clink-match`'s `GenerateContext` both assume.
fn word_bounds(line: &str, cursor: usize) -> (usize, usize) {
    let start = line[..cursor].rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
    let end = line[cursor..].find(char::is_whitespace).map(|i| cursor + i).unwrap_or(line.len());
    (start, end)
}

pub struct MatchRefreshModule {
    module_index: u8,
    file_generator: FileGenerator,
    lua_generator: Option<Box<dyn MatchGenerator + Send>>,
}

impl MatchRefreshModule {
    pub fn new(module_index: u8) -> Self {
        Self {
            module_index,
            file_generator: FileGenerator::new(WildFlags::empty()),
            lua_generator: None,
        }
    }

    pub fn with_lua_generator(mut self, generator: Box<dyn MatchGenerator + Send>) -> Self {
        self.lua_generator = Some(generator);
        self
    }
}

impl EditorModule for MatchRefreshModule {
    fn name(&self) -> &'static str {
        "match_refresh"
    }

    fn bind_input(&mut self, binder: &mut Binder, group: GroupId) -> Result<(), BinderError> {
        binder.bind(group, "\t", self.module_index, TAB_ID, false)?;
        Ok(())
    }

    fn on_input(&mut self, input: &ResolvedInput, ctx: &mut EditorContext) -> ModuleResult {
        if input.id != TAB_ID {
            return ModuleResult::Next;
        }
        let line = ctx.line.get_buffer().to_string();
        let cursor = ctx.line.get_cursor();
        let (word_start, word_end) = word_bounds(&line, cursor);
        let gen_ctx = GenerateContext { line: &line, word_start, word_end };

        let mut entries: Vec<MatchEntry> = self.file_generator.generate(&gen_ctx);
        if let Some(lua) = &self.lua_generator {
            entries.extend(lua.generate(&gen_ctx));
        }
        ctx.matches.set(entries);
        ModuleResult::Next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_bounds_isolates_the_fragment_under_cursor() {
        let line = "copy src/li";
        assert_eq!(word_bounds(line, line.len()), (5, line.len()));
    }

    #[test]
    fn word_bounds_empty_line_is_empty_span() {
        assert_eq!(word_bounds("", 0), (0, 0));
    }

    #[test]
    fn tab_populates_matches_from_current_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("alpha.txt"), "").unwrap();
        let cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(tmp.path()).unwrap();

        let registry = clink_settings::Registry::new();
        let mut ctx = EditorContext::new(&registry);
        ctx.line.insert("al");
        let mut module = MatchRefreshModule::new(0);
        let input = ResolvedInput { keys: vec![b'\t'], id: TAB_ID, params: Default::default() };
        let result = module.on_input(&input, &mut ctx);

        std::env::set_current_dir(cwd).unwrap();
        assert_eq!(result, ModuleResult::Next);
        assert_eq!(ctx.matches.len(), 1);
    }
}
