//! Bin-local glue module: Ctrl-P/Ctrl-N history recall. No library crate
//! wires `clink-history`'s data layer into an `EditorModule` — `clink-history`
//! only exposes the store and the sticky-search position tracker — so this
//! lives here, the same way `match_refresh` bridges `clink-match` into the
//! editor loop.
//!
//! Ctrl-P walks backward from the newest entry, clamping at the oldest
//! (repeated presses past the oldest entry stay put rather than erroring).
//! Ctrl-N walks forward and clears the line once it runs past the newest
//! entry, the usual shell behaviour. A live edit that diverges from the
//! text last recalled drops the sticky position, so the next Ctrl-P starts
//! a fresh walk from the newest entry again.

use clink_editor::{EditorContext, EditorModule, ModuleResult, ResolvedInput};
use clink_history::{HistoryStore, StickySearch};
use clink_keymap::{Binder, BinderError, GroupId};

const PREV_ID: u8 = 1;
const NEXT_ID: u8 = 2;

pub struct HistoryRecallModule {
    module_index: u8,
    store: HistoryStore,
    sticky: StickySearch,
}

impl HistoryRecallModule {
    pub fn new(module_index: u8, store: HistoryStore) -> Self {
        Self { module_index, store, sticky: StickySearch::new() }
    }

    fn lines(&self) -> Vec<String> {
        self.store.read_lines().map(|(_, text, _)| text.to_string()).collect()
    }

    fn recall(&mut self, ctx: &mut EditorContext, index: usize, lines: &[String]) {
        let text = &lines[index];
        ctx.line.clear();
        ctx.line.insert(text);
        self.sticky.remember(index, text);
    }
}

impl EditorModule for HistoryRecallModule {
    fn name(&self) -> &'static str {
        "history_recall"
    }

    fn bind_input(&mut self, binder: &mut Binder, group: GroupId) -> Result<(), BinderError> {
        binder.bind(group, "^p", self.module_index, PREV_ID, false)?;
        binder.bind(group, "^n", self.module_index, NEXT_ID, false)?;
        Ok(())
    }

    /// Records the accepted line once the editor loop is done with it —
    /// the layer that commits an accepted line owns the `add()` call.
    fn on_end_line(&mut self, ctx: &mut EditorContext) {
        self.store.add(ctx.line.get_buffer());
        self.sticky.reset();
    }

    fn on_input(&mut self, input: &ResolvedInput, ctx: &mut EditorContext) -> ModuleResult {
        self.sticky.observe_edit(ctx.line.get_buffer());
        let lines = self.lines();
        if lines.is_empty() {
            return ModuleResult::Next;
        }

        match input.id {
            PREV_ID => {
                let next_index = match self.sticky.position() {
                    Some(pos) => pos.saturating_sub(1),
                    None => lines.len() - 1,
                };
                self.recall(ctx, next_index, &lines);
                ModuleResult::Redraw
            }
            NEXT_ID => match self.sticky.position() {
                Some(pos) if pos + 1 < lines.len() => {
                    self.recall(ctx, pos + 1, &lines);
                    ModuleResult::Redraw
                }
                Some(_) => {
                    ctx.line.clear();
                    self.sticky.reset();
                    ModuleResult::Redraw
                }
                None => ModuleResult::Next,
            },
            _ => ModuleResult::Next,
        }
    }
}
