//! ECMA-48-aware console output (spec §4.11 "C8 out"): text runs are
//! chunked to UTF-16 and written via `WriteConsoleW`; SGR sequences update
//! a running console-attribute byte instead of being passed through raw.

use clink_ecma48::{decode, Code, Ecma48State};
use tracing::trace;

const WRITE_CHUNK: usize = 256;

/// console.h `FOREGROUND_*`/`BACKGROUND_*` bit layout: low nibble is
/// foreground (R=4,G=2,B=1,intensity=8), high nibble is background
/// (same bits shifted left 4).
const ANSI_TO_CONSOLE: [u16; 8] = [0, 4, 2, 6, 1, 5, 3, 7];
const DEFAULT_ATTRIBUTE: u16 = 0x07; // light grey on black

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOp {
    /// UTF-16 chunk, at most [`WRITE_CHUNK`] code units, ready for
    /// `WriteConsoleW`.
    WriteChars(Vec<u16>),
    /// A single wide char equivalent of a C0 control byte (anything but
    /// BEL, which is left for the caller to handle as a bell, not text).
    WriteControl(u16),
    SetAttribute(u16),
    Bell,
    /// Emitted after every flush: re-apply the cursor position to defeat
    /// conhost's blink-reset-on-write behaviour.
    RestoreCursor,
}

pub struct OutputTranslator {
    state: Ecma48State,
    attribute: u16,
}

impl Default for OutputTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputTranslator {
    pub fn new() -> Self {
        Self { state: Ecma48State::new(), attribute: DEFAULT_ATTRIBUTE }
    }

    pub fn attribute(&self) -> u16 {
        self.attribute
    }

    /// Translates one write's worth of bytes into console operations.
    pub fn translate(&mut self, bytes: &[u8]) -> Vec<ConsoleOp> {
        let codes = decode(&mut self.state, bytes);
        let mut ops = Vec::new();
        for code in codes {
            match code {
                Code::Chars(s) => {
                    let utf16: Vec<u16> = s.encode_utf16().collect();
                    for chunk in utf16.chunks(WRITE_CHUNK) {
                        ops.push(ConsoleOp::WriteChars(chunk.to_vec()));
                    }
                }
                Code::C0(0x07) => ops.push(ConsoleOp::Bell),
                Code::C0(b) => ops.push(ConsoleOp::WriteControl(b as u16)),
                Code::Csi(csi) if csi.final_byte == b'm' => {
                    self.attribute = apply_sgr(self.attribute, &csi.params);
                    ops.push(ConsoleOp::SetAttribute(self.attribute));
                }
                Code::Csi(_) | Code::C1(_) | Code::Icf(_) => {
                    trace!(target = "terminal.output", ?code, "csi_pass_through");
                }
            }
        }
        if !ops.is_empty() {
            ops.push(ConsoleOp::RestoreCursor);
        }
        ops
    }
}

fn apply_sgr(mut attr: u16, params: &smallvec::SmallVec<[i32; 8]>) -> u16 {
    let mut i = 0;
    let items: Vec<i32> = if params.is_empty() { vec![0] } else { params.to_vec() };
    while i < items.len() {
        match items[i] {
            0 => attr = DEFAULT_ATTRIBUTE,
            1 => attr |= 0x08, // foreground intensity
            22 => attr &= !0x08,
            30..=37 => {
                attr = (attr & !0x0F) | ANSI_TO_CONSOLE[(items[i] - 30) as usize];
            }
            39 => attr = (attr & !0x0F) | (DEFAULT_ATTRIBUTE & 0x0F),
            40..=47 => {
                attr = (attr & !0xF0) | (ANSI_TO_CONSOLE[(items[i] - 40) as usize] << 4);
            }
            49 => attr = (attr & !0xF0) | (DEFAULT_ATTRIBUTE & 0xF0),
            90..=97 => {
                attr = (attr & !0x0F) | ANSI_TO_CONSOLE[(items[i] - 90) as usize] | 0x08;
            }
            100..=107 => {
                attr = (attr & !0xF0) | (ANSI_TO_CONSOLE[(items[i] - 100) as usize] << 4) | 0x80;
            }
            38 | 48 => {
                // Extended colour: `38;5;N` (2 more params) or `38;2;R;G;B`
                // (4 more). Consumed so trailing params aren't misread as
                // standalone SGR codes, but not rendered (spec §4.11).
                if items.get(i + 1) == Some(&5) {
                    i += 2;
                } else if items.get(i + 1) == Some(&2) {
                    i += 4;
                }
            }
            _ => {}
        }
        i += 1;
    }
    attr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_chunked() {
        let mut t = OutputTranslator::new();
        let ops = t.translate(b"hello");
        assert_eq!(ops[0], ConsoleOp::WriteChars("hello".encode_utf16().collect()));
        assert_eq!(ops.last(), Some(&ConsoleOp::RestoreCursor));
    }

    #[test]
    fn bell_is_distinguished_from_other_c0() {
        let mut t = OutputTranslator::new();
        let ops = t.translate(b"\x07\x08");
        assert_eq!(ops[0], ConsoleOp::Bell);
        assert_eq!(ops[1], ConsoleOp::WriteControl(0x08));
    }

    #[test]
    fn sgr_red_foreground() {
        let mut t = OutputTranslator::new();
        let ops = t.translate(b"\x1b[31m");
        assert_eq!(ops[0], ConsoleOp::SetAttribute(0x04));
    }

    #[test]
    fn sgr_reset_restores_default() {
        let mut t = OutputTranslator::new();
        t.translate(b"\x1b[31;1m");
        let ops = t.translate(b"\x1b[0m");
        assert_eq!(ops[0], ConsoleOp::SetAttribute(DEFAULT_ATTRIBUTE));
    }

    #[test]
    fn extended_color_consumed_not_rendered() {
        let mut t = OutputTranslator::new();
        let before = t.attribute();
        let ops = t.translate(b"\x1b[38;5;196m");
        // attribute unaffected; an op was still emitted as a RestoreCursor
        // since translate() always finalises the CSI.
        assert_eq!(t.attribute(), before);
        assert!(ops.contains(&ConsoleOp::RestoreCursor));
    }

    #[test]
    fn other_csi_passes_through_without_attribute_change() {
        let mut t = OutputTranslator::new();
        let ops = t.translate(b"\x1b[2J");
        assert_eq!(ops, vec![ConsoleOp::RestoreCursor]);
    }
}
