//! Path split/join/normalise helpers and UTF-8<->UTF-16 conversion.
//!
//! Windows paths accept both `\` and `/` as separators; normalisation always
//! emits `\` since that is what gets handed back to `cmd.exe`.

/// Splits a path into its `\`/`/`-delimited components. Empty components
/// (from leading separators or `//`) are dropped except for a leading drive
/// root, which is preserved as the first element (e.g. `"C:\"`).
pub fn split(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' {
        let end = if bytes.len() >= 3 && is_sep(bytes[2]) { 3 } else { 2 };
        out.push(&path[..end]);
        return join_rest(&path[end..], out);
    }
    join_rest(path, out)
}

fn join_rest<'a>(rest: &'a str, mut out: Vec<&'a str>) -> Vec<&'a str> {
    out.extend(rest.split(is_sep).filter(|s| !s.is_empty()));
    out
}

fn is_sep(c: u8) -> bool {
    c == b'\\' || c == b'/'
}

/// Joins components with `\`, avoiding doubled separators.
pub fn join(parts: &[&str]) -> String {
    let mut out = String::new();
    for (i, p) in parts.iter().enumerate() {
        if p.is_empty() {
            continue;
        }
        if i > 0 && !out.ends_with(['\\', '/']) {
            out.push('\\');
        }
        out.push_str(p);
    }
    out
}

/// Normalises separators to `\`, collapses repeats, and resolves `.`/`..`
/// components. Does not touch the filesystem.
pub fn normalise(path: &str) -> String {
    let drive_prefix = if path.as_bytes().len() >= 2 && path.as_bytes()[1] == b':' {
        Some(&path[..2])
    } else {
        None
    };

    let mut stack: Vec<&str> = Vec::new();
    for comp in path.split(is_sep) {
        match comp {
            "" | "." => continue,
            ".." => {
                if matches!(stack.last(), Some(top) if *top != "..") {
                    stack.pop();
                } else if drive_prefix.is_none() {
                    stack.push("..");
                }
            }
            other => stack.push(other),
        }
    }

    let mut out = String::new();
    if let Some(d) = drive_prefix {
        out.push_str(d);
        out.push('\\');
    } else if path.as_bytes().first().is_some_and(|&b| is_sep(b)) {
        out.push('\\');
    }
    out.push_str(&stack.join("\\"));
    if out.is_empty() { ".".to_string() } else { out }
}

/// Converts a UTF-8 string to a NUL-terminated UTF-16 buffer, as required by
/// the `*W` Win32 APIs this workspace hooks.
pub fn utf8_to_utf16_nul(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Converts a UTF-16 slice (NUL terminator optional) back to a UTF-8 string,
/// using the replacement character for unpaired surrogates rather than
/// failing, since console input can legitimately contain them.
pub fn utf16_to_utf8(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_mixed_separators() {
        assert_eq!(split("foo/bar\\baz"), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn split_keeps_drive_root() {
        assert_eq!(split(r"C:\Windows\System32"), vec![r"C:\", "Windows", "System32"]);
    }

    #[test]
    fn join_avoids_double_sep() {
        assert_eq!(join(&[r"C:\", "Windows", "System32"]), r"C:\Windows\System32");
    }

    #[test]
    fn normalise_resolves_dotdot() {
        assert_eq!(normalise(r"a\b\..\c"), r"a\c");
        assert_eq!(normalise(r"a/./b"), r"a\b");
    }

    #[test]
    fn normalise_keeps_drive_absolute() {
        assert_eq!(normalise(r"C:\a\..\..\b"), r"C:\b");
    }

    #[test]
    fn utf16_round_trip() {
        let s = "héllo 世界";
        let wide = utf8_to_utf16_nul(s);
        assert_eq!(*wide.last().unwrap(), 0);
        assert_eq!(utf16_to_utf8(&wide), s);
    }
}
