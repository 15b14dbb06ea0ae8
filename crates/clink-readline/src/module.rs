//! `ReadlineModule` (C17): wraps [`crate::engine::LineEngine`] behind the
//! `EditorModule` contract per spec §4.6.

use crate::engine::{EngineOutcome, LineEngine};
use clink_ecma48::{decode, Code, Ecma48State};
use clink_editor::{EditorContext, EditorModule, ModuleResult, ResolvedInput};
use clink_keymap::{Binder, BinderError, GroupId};

/// GNU Readline's own invisible-region markers (`RL_PROMPT_START_IGNORE` /
/// `RL_PROMPT_END_IGNORE`), so column accounting skips bytes that don't
/// occupy screen columns.
const START_IGNORE: char = '\u{1}';
const END_IGNORE: char = '\u{2}';

/// Spec §4.6 `on_begin_line` step 1: walk the prompt through the ECMA-48
/// decoder and wrap every C1/ICF/CSI code in invisible-region markers.
pub fn mark_invisible_regions(prompt: &str) -> String {
    let mut state = Ecma48State::new();
    let codes = decode(&mut state, prompt.as_bytes());
    let mut out = String::with_capacity(prompt.len());
    for code in codes {
        match code {
            Code::Chars(s) => out.push_str(&s),
            Code::C0(b) => out.push(b as char),
            Code::C1(b) => {
                out.push(START_IGNORE);
                out.push('\x1b');
                out.push(b as char);
                out.push(END_IGNORE);
            }
            Code::Icf(b) => {
                out.push(START_IGNORE);
                out.push('\x1b');
                out.push(b as char);
                out.push(END_IGNORE);
            }
            Code::Csi(csi) => {
                out.push(START_IGNORE);
                out.push('\x1b');
                out.push('[');
                if let Some(p) = csi.private {
                    out.push(p as char);
                }
                for (i, param) in csi.params.iter().enumerate() {
                    if i > 0 {
                        out.push(';');
                    }
                    out.push_str(&param.to_string());
                }
                if let Some(im) = csi.intermediate {
                    out.push(im as char);
                }
                out.push(csi.final_byte as char);
                out.push(END_IGNORE);
            }
        }
    }
    out
}

pub struct ReadlineModule {
    module_index: u8,
    default_group: GroupId,
    more_input_group: Option<GroupId>,
    in_more_input: bool,
    engine: LineEngine,
    marked_prompt: String,
}

impl ReadlineModule {
    pub fn new(module_index: u8) -> Self {
        Self {
            module_index,
            default_group: 0,
            more_input_group: None,
            in_more_input: false,
            engine: LineEngine::new(),
            marked_prompt: String::new(),
        }
    }

    /// The prompt as handed to the terminal writer, with every escape
    /// sequence wrapped in invisible-region markers.
    pub fn marked_prompt(&self) -> &str {
        &self.marked_prompt
    }
}

impl EditorModule for ReadlineModule {
    fn name(&self) -> &'static str {
        "readline"
    }

    fn bind_input(&mut self, binder: &mut Binder, group: GroupId) -> Result<(), BinderError> {
        self.default_group = group;
        binder.bind_catchall(group, self.module_index)?;

        let more_input = binder.create_group("readline.more_input")?;
        binder.bind_catchall(more_input, self.module_index)?;
        self.more_input_group = Some(more_input);
        Ok(())
    }

    fn on_begin_line(&mut self, prompt: &str, _ctx: &mut EditorContext) {
        self.engine = LineEngine::new();
        self.in_more_input = false;
        self.marked_prompt = mark_invisible_regions(prompt);
    }

    fn on_input(&mut self, input: &ResolvedInput, ctx: &mut EditorContext) -> ModuleResult {
        let Some(&byte) = input.keys.first() else {
            return ModuleResult::Next;
        };

        let fired = self.engine.feed_byte(byte, &mut ctx.line);
        if fired {
            return match self.engine.take_outcome() {
                Some(EngineOutcome::Eof) => ModuleResult::Done { eof: true },
                _ => ModuleResult::Done { eof: false },
            };
        }

        let wants_more = self.engine.wants_more_input();
        if wants_more && !self.in_more_input {
            self.in_more_input = true;
            ctx.set_bind_group(self.more_input_group.expect("more_input group bound"));
            return ModuleResult::Redraw;
        }
        if !wants_more && self.in_more_input {
            self.in_more_input = false;
            // The byte that completed the sequence has already been
            // applied; `Pass` just restores the enclosing group.
            return ModuleResult::Pass;
        }
        ModuleResult::Redraw
    }

    fn on_end_line(&mut self, _ctx: &mut EditorContext) {
        self.engine.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clink_settings::Registry;

    #[test]
    fn mark_invisible_regions_wraps_csi_sgr() {
        let marked = mark_invisible_regions("\x1b[32mhi\x1b[0m");
        assert!(marked.starts_with(START_IGNORE));
        assert!(marked.contains(END_IGNORE));
        assert!(marked.contains("hi"));
    }

    #[test]
    fn mark_invisible_regions_leaves_plain_text_untouched() {
        assert_eq!(mark_invisible_regions("plain> "), "plain> ");
    }

    #[test]
    fn plain_bytes_request_redraw_without_group_switch() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut module = ReadlineModule::new(0);
        module.bind_input(&mut binder, 0).unwrap();
        module.on_begin_line("> ", &mut EditorContext::new(&registry));
        let mut ctx = EditorContext::new(&registry);
        let input = ResolvedInput { keys: vec![b'h'], id: 0xff, params: Default::default() };
        assert_eq!(module.on_input(&input, &mut ctx), ModuleResult::Redraw);
        assert_eq!(ctx.line.get_buffer(), "h");
    }

    #[test]
    fn enter_fires_done() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut module = ReadlineModule::new(0);
        module.bind_input(&mut binder, 0).unwrap();
        let mut ctx = EditorContext::new(&registry);
        module.on_begin_line("> ", &mut ctx);
        ctx.line.insert("hi");
        let input = ResolvedInput { keys: vec![b'\r'], id: 0xff, params: Default::default() };
        assert_eq!(module.on_input(&input, &mut ctx), ModuleResult::Done { eof: false });
    }

    #[test]
    fn escape_sequence_enters_then_passes_back_out_of_more_input() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut module = ReadlineModule::new(0);
        module.bind_input(&mut binder, 0).unwrap();
        let mut ctx = EditorContext::new(&registry);
        module.on_begin_line("> ", &mut ctx);

        let esc = ResolvedInput { keys: vec![0x1b], id: 0xff, params: Default::default() };
        assert_eq!(module.on_input(&esc, &mut ctx), ModuleResult::Redraw);
        assert!(module.in_more_input);

        let bracket = ResolvedInput { keys: vec![b'['], id: 0xff, params: Default::default() };
        assert_eq!(module.on_input(&bracket, &mut ctx), ModuleResult::Redraw);

        let final_byte = ResolvedInput { keys: vec![b'D'], id: 0xff, params: Default::default() };
        assert_eq!(module.on_input(&final_byte, &mut ctx), ModuleResult::Pass);
        assert!(!module.in_more_input);
    }
}
