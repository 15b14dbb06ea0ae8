//! Prompt capture and tagging (C9). Grounded on spec §4.12: a tag that
//! renders as zero visible columns, so cmd.exe's own prompt text is
//! unaffected on screen while we can still recognise it on readback.

/// Letters of the hidden tag; each is followed by a backspace so the whole
/// marker renders as zero columns advanced.
const HIDDEN_TAG_LETTERS: &str = "clk";
const BACKSPACE: char = '\u{8}';
/// Sentinel prefix for a prompt that arrived already tagged from outside
/// us (paste, re-exec) — no backspaces, so it *does* take up a column,
/// but that's expected since we didn't write it ourselves.
const PLAIN_TAG_PREFIX: char = '\u{1}';

fn hidden_tag() -> String {
    let mut s = String::new();
    for c in HIDDEN_TAG_LETTERS.chars() {
        s.push(c);
        s.push(BACKSPACE);
    }
    s
}

pub fn has_hidden_tag(value: &str) -> bool {
    value.starts_with(&hidden_tag())
}

pub fn has_plain_tag(value: &str) -> bool {
    value.starts_with(PLAIN_TAG_PREFIX)
}

pub fn is_tagged(value: &str) -> bool {
    has_hidden_tag(value) || has_plain_tag(value)
}

/// Idempotent: a value that's already tagged (either form) is returned
/// verbatim.
pub fn tag(value: &str) -> String {
    if is_tagged(value) {
        value.to_string()
    } else {
        format!("{}{value}", hidden_tag())
    }
}

/// Strips a recognised tag, returning the underlying prompt text.
pub fn untag(value: &str) -> &str {
    if has_hidden_tag(value) {
        &value[hidden_tag().len()..]
    } else if has_plain_tag(value) {
        &value[PLAIN_TAG_PREFIX.len_utf8()..]
    } else {
        value
    }
}

#[cfg(windows)]
pub fn read_visible_prompt(
    handle: windows_sys::Win32::Foundation::HANDLE,
) -> crate::Result<String> {
    use windows_sys::Win32::System::Console::{
        GetConsoleScreenBufferInfo, ReadConsoleOutputCharacterW, CONSOLE_SCREEN_BUFFER_INFO, COORD,
    };

    let mut info: CONSOLE_SCREEN_BUFFER_INFO = unsafe { std::mem::zeroed() };
    if unsafe { GetConsoleScreenBufferInfo(handle, &mut info) } == 0 {
        return Err(crate::HostError::Win32(unsafe {
            windows_sys::Win32::Foundation::GetLastError()
        }));
    }
    let row = info.dwCursorPosition.Y;
    let cols = info.dwCursorPosition.X.max(0) as usize;
    if cols == 0 {
        return Ok(String::new());
    }
    let mut buf = vec![0u16; cols];
    let mut read = 0u32;
    let origin = COORD { X: 0, Y: row };
    let ok = unsafe {
        ReadConsoleOutputCharacterW(handle, buf.as_mut_ptr(), cols as u32, origin, &mut read)
    };
    if ok == 0 {
        return Err(crate::HostError::Win32(unsafe {
            windows_sys::Win32::Foundation::GetLastError()
        }));
    }
    buf.truncate(read as usize);
    Ok(String::from_utf16_lossy(&buf))
}
