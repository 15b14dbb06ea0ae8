//! The line editor loop (C14): `begin_line` / `update` / `end_line`, plus
//! `edit` as the high-level convenience that drives the loop to completion.
//!
//! Grounded on `core-events`'s `AsyncEventSource` dispatch loop shape,
//! generalized from a single event source to the resolver-driven
//! multi-module dispatch in spec §4.5.

use crate::context::EditorContext;
use crate::module::{EditorModule, ModuleResult, ResolvedInput};
use clink_keymap::{Binder, BinderError, GroupId, Resolver};
use clink_settings::Registry;
use clink_terminal::{ConsoleModeGuard, TerminalError};
use std::env;
use tracing::{trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("terminal error: {0}")]
    Terminal(#[from] TerminalError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("key binding error: {0}")]
    Bind(#[from] BinderError),
}

pub type Result<T> = std::result::Result<T, EditorError>;

/// What `edit()` returns once a module requests `done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    pub text: String,
    pub eof: bool,
}

pub struct LineEditor {
    binder: Binder,
    resolver: Resolver,
    default_group: GroupId,
    modules: Vec<Box<dyn EditorModule>>,
    ctx: EditorContext,
    terminal: Option<ConsoleModeGuard>,
    chord_buf: Vec<u8>,
    last_match_count: usize,
    done: Option<LineResult>,
}

impl LineEditor {
    pub fn new(registry: &Registry, modules: Vec<Box<dyn EditorModule>>) -> Self {
        let binder = Binder::new();
        let default_group = binder.default_group();
        let resolver = Resolver::new(&binder);
        Self {
            binder,
            resolver,
            default_group,
            modules,
            ctx: EditorContext::new(registry),
            terminal: None,
            chord_buf: Vec::new(),
            last_match_count: 0,
            done: None,
        }
    }

    pub fn ctx(&self) -> &EditorContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut EditorContext {
        &mut self.ctx
    }

    /// Spec §4.5 `begin_line`: save cwd, apply compare scope, open the
    /// terminal, bind and start every module.
    pub fn begin_line(&mut self, prompt: &str, registry: &Registry) -> Result<()> {
        self.ctx.save_cwd(env::current_dir()?);
        self.ctx.apply_compare_scope(registry);
        self.terminal = Some(ConsoleModeGuard::enter_stdin()?);

        for module in &mut self.modules {
            module.bind_input(&mut self.binder, self.default_group)?;
        }
        self.resolver = Resolver::new(&self.binder);
        for module in &mut self.modules {
            module.on_begin_line(prompt, &mut self.ctx);
        }
        Ok(())
    }

    /// Feeds one byte through the resolver and dispatches any bindings it
    /// resolves to. Returns the accepted line once a module requests
    /// `done` (spec §4.5 `update`).
    pub fn update(&mut self, byte: u8) -> Option<LineResult> {
        if self.resolver.step(&self.binder, byte) {
            self.dispatch_pending();
        }

        let match_count = self.ctx.matches.len();
        if match_count != self.last_match_count {
            self.last_match_count = match_count;
            for module in &mut self.modules {
                module.on_matches_changed(&mut self.ctx);
            }
        }

        self.done.clone()
    }

    fn dispatch_pending(&mut self) {
        while let Some(bound) = self.resolver.next() {
            self.resolver.get_chord(&mut self.chord_buf);
            let input = ResolvedInput {
                keys: self.chord_buf.clone(),
                id: bound.id,
                params: bound.params,
            };
            let Some(module) = self.modules.get_mut(bound.module as usize) else {
                warn!(target = "editor.loop", module = bound.module, "unknown_bind_module_ignored");
                continue;
            };

            match module.on_input(&input, &mut self.ctx) {
                ModuleResult::Next => continue,
                ModuleResult::Pass => {
                    // Restores the enclosing group; does not re-feed the
                    // chord that was just consumed. A sub-mode module that
                    // passes on a chord it doesn't own gives it up rather
                    // than getting it re-resolved at the outer scope.
                    let restore = self.ctx.pop_group().unwrap_or(self.default_group);
                    self.resolver.set_group(&self.binder, restore);
                    break;
                }
                ModuleResult::Redraw => {
                    self.ctx.line.redraw();
                    break;
                }
                ModuleResult::AcceptMatch(index) => {
                    if let Some(entry) = self.ctx.matches.get(index) {
                        let text = entry.match_text.clone();
                        self.ctx.line.clear();
                        self.ctx.line.insert(&text);
                    }
                    break;
                }
                ModuleResult::AppendMatchLcd => {
                    let lcd = self.ctx.matches.lcd(self.ctx.compare_scope);
                    if !lcd.is_empty() {
                        self.ctx.line.insert(&lcd);
                    }
                    break;
                }
                ModuleResult::Done { eof } => {
                    self.done = Some(LineResult {
                        text: self.ctx.line.get_buffer().to_string(),
                        eof,
                    });
                    return;
                }
            }
        }

        if let Some(group) = self.ctx.take_pending_group() {
            trace!(target = "editor.loop", group, "bind_group_switch");
            self.ctx.push_group(self.resolver.get_group());
            self.resolver.set_group(&self.binder, group);
        }
    }

    /// Spec §4.5 `end_line`: notify modules in reverse order, close the
    /// terminal, restore cwd.
    pub fn end_line(&mut self) -> Result<()> {
        for module in self.modules.iter_mut().rev() {
            module.on_end_line(&mut self.ctx);
        }
        if let Some(mut guard) = self.terminal.take() {
            guard.leave()?;
        }
        if let Some(cwd) = self.ctx.take_saved_cwd() {
            let _ = env::set_current_dir(cwd);
        }
        Ok(())
    }

    pub fn on_terminal_resize(&mut self, cols: u16, rows: u16) {
        for module in &mut self.modules {
            module.on_terminal_resize(cols, rows, &mut self.ctx);
        }
    }

    /// Runs `begin_line` → repeated `update()` → `end_line()` to completion,
    /// pulling bytes from `next_byte` until it yields `None` or a module
    /// requests `done` (spec §4.5: "`edit(out)` is the high-level
    /// convenience").
    pub fn edit(
        &mut self,
        prompt: &str,
        registry: &Registry,
        mut next_byte: impl FnMut() -> Option<u8>,
    ) -> Result<LineResult> {
        self.begin_line(prompt, registry)?;
        let result = loop {
            let Some(byte) = next_byte() else {
                break LineResult { text: self.ctx.line.get_buffer().to_string(), eof: true };
            };
            if let Some(result) = self.update(byte) {
                break result;
            }
        };
        self.end_line()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clink_keymap::GroupId as Group;
    use clink_settings::Registry;

    struct EchoModule;

    impl EditorModule for EchoModule {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn bind_input(&mut self, binder: &mut Binder, group: Group) -> std::result::Result<(), BinderError> {
            binder.bind(group, "\r", 0, 1, false)?;
            binder.bind_catchall(group, 0)?;
            Ok(())
        }

        fn on_input(&mut self, input: &ResolvedInput, ctx: &mut EditorContext) -> ModuleResult {
            if input.id == 1 {
                return ModuleResult::Done { eof: false };
            }
            if let Some(&byte) = input.keys.first() {
                ctx.line.insert(&(byte as char).to_string());
            }
            ModuleResult::Redraw
        }
    }

    #[test]
    fn edit_accumulates_bytes_until_enter() {
        let registry = Registry::new();
        let mut editor = LineEditor::new(&registry, vec![Box::new(EchoModule)]);
        let input = b"hi\r";
        let mut iter = input.iter().copied();
        let result = editor.edit(">", &registry, || iter.next()).unwrap();
        assert_eq!(result.text, "hi");
        assert!(!result.eof);
    }

    #[test]
    fn edit_reports_eof_when_input_exhausted_without_enter() {
        let registry = Registry::new();
        let mut editor = LineEditor::new(&registry, vec![Box::new(EchoModule)]);
        let input = b"ab";
        let mut iter = input.iter().copied();
        let result = editor.edit(">", &registry, || iter.next()).unwrap();
        assert_eq!(result.text, "ab");
        assert!(result.eof);
    }
}
