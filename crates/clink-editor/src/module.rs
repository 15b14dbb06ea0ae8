//! Editor module protocol (C13). Grounded on `core-events::EventHooks`'s
//! no-op-default trait shape, generalized from passive observation to an
//! active bind/input/lifecycle contract each composable module implements.

use crate::context::EditorContext;
use clink_keymap::{Binder, BinderError, GroupId};
use smallvec::SmallVec;

/// One resolved binding dispatched to a module's `on_input`.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub keys: Vec<u8>,
    pub id: u8,
    pub params: SmallVec<[u16; 4]>,
}

/// What a module wants the editor loop to do after handling one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleResult {
    /// Try the next binding at this leaf (another module owns the same chord).
    Next,
    /// Restore the previous bind group and re-dispatch these bytes there.
    Pass,
    /// Redisplay is needed; no control-flow change.
    Redraw,
    AcceptMatch(usize),
    AppendMatchLcd,
    Done { eof: bool },
}

/// Implemented by every composable editor module (the readline adapter,
/// the classic match UI, the scroller, ...). Default bodies are no-ops so
/// a module only overrides what it actually needs, mirroring
/// `core-events::EventHooks`'s `pre_handle`/`post_handle` defaults.
pub trait EditorModule: Send {
    fn name(&self) -> &'static str;

    /// Registers this module's chords in `binder`, starting in `group`
    /// (the default group unless the module creates and returns into its
    /// own sub-group). Fallible: a module can run out of binder arena
    /// space or pass an out-of-range module index, and neither may ever
    /// panic the host shell process.
    fn bind_input(&mut self, binder: &mut Binder, group: GroupId) -> Result<(), BinderError>;

    fn on_begin_line(&mut self, _prompt: &str, _ctx: &mut EditorContext) {}

    /// Called once per resolved binding whose module index is this
    /// module's. Returns what the loop should do next.
    fn on_input(&mut self, _input: &ResolvedInput, _ctx: &mut EditorContext) -> ModuleResult {
        ModuleResult::Next
    }

    fn on_matches_changed(&mut self, _ctx: &mut EditorContext) {}

    fn on_terminal_resize(&mut self, _cols: u16, _rows: u16, _ctx: &mut EditorContext) {}

    fn on_end_line(&mut self, _ctx: &mut EditorContext) {}
}
