//! ECMA-48 decoder (C2): a stateful byte-stream iterator that turns raw
//! bytes into typed "codes" — ordinary text runs, C0 controls, C1 controls,
//! independent control functions, and CSI sequences with parsed parameters.
//!
//! The decoder never errors: an invalid or truncated CSI sequence rewinds
//! and is re-emitted as a plain `C1` escape code, and any partial sequence
//! sitting at the end of a buffer is retained in [`Ecma48State`] and resumed
//! on the next call, so `decode(p) ++ decode(q)` (sharing state) always
//! equals `decode(pq)`.

use smallvec::SmallVec;

pub const MAX_CSI_PARAMS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsiCode {
    pub params: SmallVec<[i32; MAX_CSI_PARAMS]>,
    pub intermediate: Option<u8>,
    pub private: Option<u8>,
    pub final_byte: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    /// A run of ordinary (non-control) bytes, valid UTF-8.
    Chars(String),
    /// A single C0 control byte (0x00..=0x1F, excluding ESC itself which
    /// starts C1/CSI/ICF sequences).
    C0(u8),
    /// `ESC` followed by a byte in `0x40..=0x5F`.
    C1(u8),
    /// `ESC` followed by a byte in `0x60..=0x7F` (independent control
    /// function).
    Icf(u8),
    /// `ESC '[' params... final`.
    Csi(CsiCode),
}

#[derive(Debug, Default, Clone)]
enum Partial {
    #[default]
    None,
    /// Saw ESC, waiting for the next byte.
    Esc,
    /// Saw `ESC [`, accumulating parameter/intermediate bytes.
    Csi {
        params: SmallVec<[i32; MAX_CSI_PARAMS]>,
        cur: Option<i32>,
        intermediate: Option<u8>,
        private: Option<u8>,
    },
}

/// Retained decoder state, carried across calls to [`decode`].
#[derive(Debug, Default, Clone)]
pub struct Ecma48State {
    partial: Partial,
}

impl Ecma48State {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a sequence is mid-flight (nothing to resume means a fresh
    /// `decode` call starts at the top level).
    pub fn is_idle(&self) -> bool {
        matches!(self.partial, Partial::None)
    }
}

fn is_c1_final(b: u8) -> bool {
    (0x40..=0x5F).contains(&b)
}
fn is_icf_final(b: u8) -> bool {
    (0x60..=0x7F).contains(&b)
}
fn is_csi_param(b: u8) -> bool {
    b.is_ascii_digit() || b == b';'
}
fn is_csi_intermediate(b: u8) -> bool {
    (0x20..=0x2F).contains(&b)
}
fn is_csi_private(b: u8) -> bool {
    (0x3C..=0x3F).contains(&b)
}
fn is_csi_final(b: u8) -> bool {
    (0x40..=0x7E).contains(&b)
}

/// Decodes as many complete codes as possible out of `bytes`, updating
/// `state` in place so a subsequent call with more bytes resumes correctly.
/// Returns the codes produced, in order.
pub fn decode(state: &mut Ecma48State, bytes: &[u8]) -> Vec<Code> {
    let mut out = Vec::new();
    let mut chars_run: Vec<u8> = Vec::new();
    let mut i = 0;

    macro_rules! flush_chars {
        () => {
            if !chars_run.is_empty() {
                out.push(Code::Chars(String::from_utf8_lossy(&chars_run).into_owned()));
                chars_run.clear();
            }
        };
    }

    while i < bytes.len() {
        let b = bytes[i];
        match std::mem::take(&mut state.partial) {
            Partial::None => {
                if b == 0x1B {
                    flush_chars!();
                    state.partial = Partial::Esc;
                    i += 1;
                } else if b < 0x20 || b == 0x7F {
                    flush_chars!();
                    out.push(Code::C0(b));
                    i += 1;
                } else {
                    chars_run.push(b);
                    i += 1;
                }
            }
            Partial::Esc => {
                if b == b'[' {
                    state.partial = Partial::Csi {
                        params: SmallVec::new(),
                        cur: None,
                        intermediate: None,
                        private: None,
                    };
                    i += 1;
                } else if is_c1_final(b) {
                    out.push(Code::C1(b));
                    i += 1;
                } else if is_icf_final(b) {
                    out.push(Code::Icf(b));
                    i += 1;
                } else {
                    // Invalid continuation: rewind, emit the bare ESC as a
                    // pass-through C1 code, and reprocess `b` at top level.
                    out.push(Code::C1(0));
                    // do not consume b; loop again at None state.
                }
            }
            Partial::Csi {
                mut params,
                mut cur,
                mut intermediate,
                mut private,
            } => {
                if is_csi_private(b) && params.is_empty() && cur.is_none() && private.is_none() {
                    private = Some(b);
                    i += 1;
                } else if b.is_ascii_digit() {
                    let d = (b - b'0') as i32;
                    cur = Some(cur.unwrap_or(0).saturating_mul(10).saturating_add(d));
                    i += 1;
                } else if b == b';' {
                    params.push(cur.take().unwrap_or(0));
                    i += 1;
                } else if is_csi_intermediate(b) {
                    intermediate = Some(b);
                    i += 1;
                } else if is_csi_final(b) {
                    if let Some(c) = cur.take() {
                        params.push(c);
                    }
                    if params.len() > MAX_CSI_PARAMS {
                        params.truncate(MAX_CSI_PARAMS);
                    }
                    out.push(Code::Csi(CsiCode {
                        params,
                        intermediate,
                        private,
                        final_byte: b,
                    }));
                    i += 1;
                    continue;
                } else {
                    // Malformed CSI: bail out, treat as a bare ESC pass-through
                    // and reprocess the rest (including `[`) from top level.
                    out.push(Code::C1(0));
                    continue;
                }
                state.partial = Partial::Csi {
                    params,
                    cur,
                    intermediate,
                    private,
                };
            }
        }
    }
    flush_chars!();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<Code> {
        let mut st = Ecma48State::new();
        decode(&mut st, bytes)
    }

    #[test]
    fn plain_text_run() {
        assert_eq!(decode_all(b"hello"), vec![Code::Chars("hello".into())]);
    }

    #[test]
    fn c0_control_splits_run() {
        let codes = decode_all(b"ab\ncd");
        assert_eq!(
            codes,
            vec![
                Code::Chars("ab".into()),
                Code::C0(b'\n'),
                Code::Chars("cd".into())
            ]
        );
    }

    #[test]
    fn csi_sgr_params() {
        let codes = decode_all(b"\x1b[31;1mHi");
        assert_eq!(
            codes[0],
            Code::Csi(CsiCode {
                params: SmallVec::from_slice(&[31, 1]),
                intermediate: None,
                private: None,
                final_byte: b'm',
            })
        );
        assert_eq!(codes[1], Code::Chars("Hi".into()));
    }

    #[test]
    fn csi_default_param_is_zero() {
        let codes = decode_all(b"\x1b[m");
        match &codes[0] {
            Code::Csi(c) => assert!(c.params.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn csi_private_marker_preserved() {
        let codes = decode_all(b"\x1b[?25h");
        match &codes[0] {
            Code::Csi(c) => {
                assert_eq!(c.private, Some(b'?'));
                assert_eq!(c.final_byte, b'h');
                assert_eq!(c.params[0], 25);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_csi_rewinds_to_bare_esc() {
        // ESC [ followed by a byte that is neither param, intermediate nor
        // final (e.g. a raw control char) is not a legal CSI; the leading
        // ESC is passed through and the rest reprocessed.
        let codes = decode_all(b"\x1b[\x01x");
        assert_eq!(codes[0], Code::C1(0));
    }

    #[test]
    fn partial_sequence_resumes_across_calls() {
        let mut st = Ecma48State::new();
        let first = decode(&mut st, b"\x1b[3");
        assert!(first.is_empty());
        assert!(!st.is_idle());
        let second = decode(&mut st, b"1m");
        assert_eq!(
            second[0],
            Code::Csi(CsiCode {
                params: SmallVec::from_slice(&[31]),
                intermediate: None,
                private: None,
                final_byte: b'm',
            })
        );
    }

    #[test]
    fn property_split_decode_matches_whole_decode() {
        let whole = b"abc\x1b[1;2mdef\x1b[0mghi\n".to_vec();
        for split_at in 0..=whole.len() {
            let (p, q) = whole.split_at(split_at);
            let mut st = Ecma48State::new();
            let mut combined = decode(&mut st, p);
            combined.extend(decode(&mut st, q));
            let mut st2 = Ecma48State::new();
            let direct = decode(&mut st2, &whole);
            assert_eq!(combined, direct, "split at {split_at}");
        }
    }

    #[test]
    fn c1_and_icf_codes() {
        let codes = decode_all(&[0x1b, b'D', 0x1b, b'p']);
        assert_eq!(codes, vec![Code::C1(b'D'), Code::Icf(b'p')]);
    }
}
