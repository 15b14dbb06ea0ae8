//! The line engine (spec §4.6): the thing `ReadlineModule` pumps bytes
//! into one at a time. Treated by the rest of the editor as a black box
//! with a character-callback entry point and an internal state mask.
//!
//! There is no publicly reachable byte-at-a-time pump in any packaged
//! readline-alike crate (`rustyline` owns its own blocking terminal read
//! loop internally), so the decode side is built directly on
//! [`clink_ecma48`]'s resumable decoder — exactly the "is a sequence
//! mid-flight" signal spec needs to decide whether to ask for
//! `more_input`. `rustyline`'s [`KeyEvent`]/[`KeyCode`] types are reused as
//! the typed vocabulary a decoded byte or escape sequence is translated
//! into before it's applied to the line buffer, so the same key
//! vocabulary other Clink-adjacent tooling uses for `bind_sequence`-style
//! configuration applies here too.

use bitflags::bitflags;
use clink_ecma48::{decode, Code, Ecma48State};
use clink_editor::LineBuffer;
use rustyline::{KeyCode, KeyEvent, Modifiers};

bitflags! {
    /// The four bits spec §9 names from the wrapped engine's internal
    /// state mask. Treated as an opaque capability query, not a bitfield
    /// we reason about structurally — unnamed bits are never inspected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EngineStatus: u32 {
        const CALLBACK = 1 << 0;
        const INITIALIZED = 1 << 1;
        const OVERWRITE = 1 << 2;
        const VICMDONCE = 1 << 3;
    }
}

impl Default for EngineStatus {
    fn default() -> Self {
        EngineStatus::CALLBACK | EngineStatus::INITIALIZED
    }
}

/// What the engine produced once its handler has fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    Line(String),
    Eof,
}

fn prev_char_boundary(s: &str, from: usize) -> usize {
    let mut i = from;
    while i > 0 {
        i -= 1;
        if s.is_char_boundary(i) {
            return i;
        }
    }
    0
}

fn next_char_boundary(s: &str, from: usize) -> usize {
    let mut i = from;
    while i < s.len() {
        i += 1;
        if s.is_char_boundary(i) {
            return i;
        }
    }
    s.len()
}

fn translate(code: &Code) -> Option<KeyEvent> {
    match code {
        Code::Chars(s) => s.chars().next().map(|c| KeyEvent(KeyCode::Char(c), Modifiers::NONE)),
        Code::C0(b'\r') | Code::C0(b'\n') => Some(KeyEvent(KeyCode::Enter, Modifiers::NONE)),
        Code::C0(0x7f) | Code::C0(0x08) => Some(KeyEvent(KeyCode::Backspace, Modifiers::NONE)),
        Code::C0(0x04) => Some(KeyEvent(KeyCode::Char('d'), Modifiers::CTRL)),
        Code::C0(0x01) => Some(KeyEvent(KeyCode::Home, Modifiers::NONE)),
        Code::C0(0x05) => Some(KeyEvent(KeyCode::End, Modifiers::NONE)),
        Code::C0(0x09) => Some(KeyEvent(KeyCode::Tab, Modifiers::NONE)),
        Code::C0(_) => None,
        Code::Csi(csi) => match csi.final_byte {
            b'D' => Some(KeyEvent(KeyCode::Left, Modifiers::NONE)),
            b'C' => Some(KeyEvent(KeyCode::Right, Modifiers::NONE)),
            b'A' => Some(KeyEvent(KeyCode::Up, Modifiers::NONE)),
            b'B' => Some(KeyEvent(KeyCode::Down, Modifiers::NONE)),
            b'H' => Some(KeyEvent(KeyCode::Home, Modifiers::NONE)),
            b'F' => Some(KeyEvent(KeyCode::End, Modifiers::NONE)),
            b'~' if csi.params.first() == Some(&3) => Some(KeyEvent(KeyCode::Delete, Modifiers::NONE)),
            _ => None,
        },
        Code::C1(_) | Code::Icf(_) => None,
    }
}

/// The wrapped line-editing engine. Owns decode state across calls so a
/// multi-byte escape sequence split across two `feed_byte` calls still
/// resolves to one key.
pub struct LineEngine {
    status: EngineStatus,
    decoder: Ecma48State,
    outcome: Option<EngineOutcome>,
}

impl LineEngine {
    pub fn new() -> Self {
        Self { status: EngineStatus::default(), decoder: Ecma48State::new(), outcome: None }
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn set_overwrite(&mut self, on: bool) {
        self.status.set(EngineStatus::OVERWRITE, on);
    }

    /// Spec §4.6: "if `~(CALLBACK|INITIALIZED|OVERWRITE|VICMDONCE)` is
    /// nonzero, request `more_input`". The only byte-level signal we have
    /// for "mid-sequence" is the ECMA-48 decoder not being idle.
    pub fn wants_more_input(&self) -> bool {
        !self.decoder.is_idle()
    }

    /// Feeds one raw byte, applying any resulting key to `line`. Returns
    /// `true` once the engine's handler has fired (Enter or EOF).
    pub fn feed_byte(&mut self, byte: u8, line: &mut LineBuffer) -> bool {
        for code in decode(&mut self.decoder, &[byte]) {
            let Some(key) = translate(&code) else { continue };
            self.apply(key, line);
            if self.outcome.is_some() {
                return true;
            }
        }
        false
    }

    fn apply(&mut self, key: KeyEvent, line: &mut LineBuffer) {
        match key {
            KeyEvent(KeyCode::Char('d'), Modifiers::CTRL) if line.get_buffer().is_empty() => {
                self.outcome = Some(EngineOutcome::Eof);
            }
            KeyEvent(KeyCode::Enter, _) => {
                self.outcome = Some(EngineOutcome::Line(line.get_buffer().to_string()));
            }
            KeyEvent(KeyCode::Char(c), Modifiers::NONE) => {
                let mut buf = [0u8; 4];
                line.insert(c.encode_utf8(&mut buf));
            }
            KeyEvent(KeyCode::Backspace, _) => {
                let cursor = line.get_cursor();
                if cursor > 0 {
                    let from = prev_char_boundary(line.get_buffer(), cursor);
                    line.remove(from, cursor);
                }
            }
            KeyEvent(KeyCode::Delete, _) => {
                let cursor = line.get_cursor();
                let to = next_char_boundary(line.get_buffer(), cursor);
                line.remove(cursor, to);
            }
            KeyEvent(KeyCode::Left, _) => {
                let pos = prev_char_boundary(line.get_buffer(), line.get_cursor());
                line.set_cursor(pos);
            }
            KeyEvent(KeyCode::Right, _) => {
                let pos = next_char_boundary(line.get_buffer(), line.get_cursor());
                line.set_cursor(pos);
            }
            KeyEvent(KeyCode::Home, _) => line.set_cursor(0),
            KeyEvent(KeyCode::End, _) => line.set_cursor(line.get_buffer().len()),
            _ => {}
        }
    }

    pub fn take_outcome(&mut self) -> Option<EngineOutcome> {
        self.outcome.take()
    }

    /// Spec §4.6 `on_end_line`: release the engine's line buffer so the
    /// engine cannot free bytes we still want to inspect. Our engine
    /// doesn't own a separate copy, so this just resets decode state for
    /// the next line.
    pub fn release(&mut self) {
        self.decoder = Ecma48State::new();
        self.outcome = None;
    }
}

impl Default for LineEngine {
    fn default() -> Self {
        Self::new()
    }
}
