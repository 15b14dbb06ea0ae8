//! `INPUT_RECORD` → xterm-style byte sequence translation (spec §4.11).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ControlKeyState: u32 {
        const RIGHT_ALT  = 1 << 0;
        const LEFT_ALT   = 1 << 1;
        const RIGHT_CTRL = 1 << 2;
        const LEFT_CTRL  = 1 << 3;
        const SHIFT      = 1 << 4;
    }
}

impl ControlKeyState {
    pub fn alt(self) -> bool {
        self.intersects(Self::LEFT_ALT | Self::RIGHT_ALT)
    }
    pub fn ctrl(self) -> bool {
        self.intersects(Self::LEFT_CTRL | Self::RIGHT_CTRL)
    }
    pub fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }
    /// AltGr shows up as simultaneous right-alt + left-ctrl.
    pub fn is_altgr(self) -> bool {
        self.contains(Self::RIGHT_ALT) && self.contains(Self::LEFT_CTRL)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key_down: bool,
    pub virtual_key: u16,
    pub unicode_char: u16,
    pub control_key_state: ControlKeyState,
}

/// Windows marks numpad-overloaded navigation keys (Home/End/arrows/etc)
/// with `ENHANCED_KEY` in the real `INPUT_RECORD`; this is the matching
/// virtual-key allowlist used to decide whether to consult the CSI table.
pub const ENHANCED_KEY: [u16; 10] = [
    0x21, // VK_PRIOR (PageUp)
    0x22, // VK_NEXT  (PageDown)
    0x23, // VK_END
    0x24, // VK_HOME
    0x25, // VK_LEFT
    0x26, // VK_UP
    0x27, // VK_RIGHT
    0x28, // VK_DOWN
    0x2D, // VK_INSERT
    0x2E, // VK_DELETE
];

fn is_enhanced(vk: u16) -> bool {
    ENHANCED_KEY.contains(&vk)
}

/// `(no-modifier final byte, shifted final byte)` for the CSI/SS3 cursor
/// and editing keys, keyed by virtual-key code.
fn csi_final(vk: u16) -> Option<(u8, u8)> {
    Some(match vk {
        0x26 => (b'A', b'A'), // Up
        0x28 => (b'B', b'B'), // Down
        0x27 => (b'C', b'C'), // Right
        0x25 => (b'D', b'D'), // Left
        0x24 => (b'H', b'H'), // Home
        0x23 => (b'F', b'F'), // End
        _ => return None,
    })
}

const VK_TAB: u16 = 0x09;

/// Translates one key-down event into the bytes Clink's terminal input
/// should deliver to the editor. Key-up events and non-key records aren't
/// represented here; callers filter those before calling in.
pub fn translate_key_event(key: &KeyEvent, altgr_enabled: bool) -> Vec<u8> {
    let mut out = Vec::new();

    if key.control_key_state.is_altgr() && altgr_enabled && key.unicode_char != 0 {
        push_utf8(&mut out, key.unicode_char);
        return out;
    }

    if key.virtual_key == VK_TAB && key.control_key_state.shift() {
        out.extend_from_slice(b"\x1b[Z");
        return out;
    }

    if key.unicode_char != 0 {
        if key.control_key_state.alt() && !key.control_key_state.is_altgr() {
            out.push(0x1b);
        }
        push_utf8(&mut out, key.unicode_char);
        return out;
    }

    if is_enhanced(key.virtual_key) {
        if let Some((normal, shifted)) = csi_final(key.virtual_key) {
            let lead: &[u8] = if key.control_key_state.ctrl() { b"\x1bO" } else { b"\x1b[" };
            out.extend_from_slice(lead);
            if !key.control_key_state.ctrl() && key.control_key_state.shift() {
                out.extend_from_slice(b"1;2");
                out.push(shifted);
            } else {
                out.push(normal);
            }
        }
        return out;
    }

    if key.control_key_state.ctrl() {
        if let Some(byte) = control_byte_for_vk(key.virtual_key) {
            if key.control_key_state.alt() {
                out.push(0x1b);
            }
            out.push(byte);
        }
    }

    out
}

fn control_byte_for_vk(vk: u16) -> Option<u8> {
    match vk {
        0x41..=0x5A => Some((vk as u8 - b'A' + 1).min(26)), // A..Z -> 1..26
        0xDB => Some(0x1b), // '['
        0xDD => Some(0x1d), // ']'
        0x32 => Some(0),    // '2' -> NUL
        0x36 => Some(0x1e), // '6'
        0xBD => Some(0x1f), // '-'
        _ => None,
    }
}

fn push_utf8(out: &mut Vec<u8>, unicode_char: u16) {
    if let Some(c) = char::from_u32(unicode_char as u32) {
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(vk: u16, unicode: u16, state: ControlKeyState) -> KeyEvent {
        KeyEvent { key_down: true, virtual_key: vk, unicode_char: unicode, control_key_state: state }
    }

    #[test]
    fn plain_char_passthrough() {
        let k = key(b'A' as u16, b'a' as u16, ControlKeyState::empty());
        assert_eq!(translate_key_event(&k, false), vec![b'a']);
    }

    #[test]
    fn alt_prefixes_esc() {
        let k = key(b'A' as u16, b'a' as u16, ControlKeyState::LEFT_ALT);
        assert_eq!(translate_key_event(&k, false), vec![0x1b, b'a']);
    }

    #[test]
    fn altgr_treated_as_unicode_when_enabled() {
        let k = key(0, b'@' as u16, ControlKeyState::RIGHT_ALT | ControlKeyState::LEFT_CTRL);
        assert_eq!(translate_key_event(&k, true), vec![b'@']);
    }

    #[test]
    fn shift_tab_emits_csi_z() {
        let k = key(VK_TAB, 0, ControlKeyState::SHIFT);
        assert_eq!(translate_key_event(&k, false), b"\x1b[Z".to_vec());
    }

    #[test]
    fn arrow_key_emits_csi() {
        let k = key(0x26, 0, ControlKeyState::empty());
        assert_eq!(translate_key_event(&k, false), b"\x1b[A".to_vec());
    }

    #[test]
    fn ctrl_arrow_uses_ss3_lead() {
        let k = key(0x26, 0, ControlKeyState::LEFT_CTRL);
        assert_eq!(translate_key_event(&k, false), b"\x1bOA".to_vec());
    }

    #[test]
    fn shifted_arrow_uses_modifier_param() {
        let k = key(0x24, 0, ControlKeyState::SHIFT);
        assert_eq!(translate_key_event(&k, false), b"\x1b[1;2H".to_vec());
    }

    #[test]
    fn ctrl_letter_synthesises_control_byte() {
        let k = key(b'X' as u16, 0, ControlKeyState::LEFT_CTRL);
        assert_eq!(translate_key_event(&k, false), vec![0x18]);
    }
}
