//! POSIX `fnmatch`-plus-wildstar pattern matcher (C3).
//!
//! Semantics per the line-editor spec: `fnmatch` flags plus a `WILDSTAR`
//! extension where `**` crosses path-separator boundaries (and implies
//! `PATHNAME`). Character classes (`[:alpha:]` etc.), negated brackets
//! (`[!...]` and `[^...]`), and `**`-run collapsing are all supported.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WildFlags: u32 {
        /// `\` is an ordinary character, not an escape.
        const NOESCAPE    = 1 << 0;
        /// `*` and `?` never match a path separator.
        const PATHNAME    = 1 << 1;
        /// A leading `.` in a path component must be matched explicitly.
        const PERIOD      = 1 << 2;
        /// Pattern may match a leading directory prefix of the path.
        const LEADING_DIR = 1 << 3;
        /// ASCII case-insensitive.
        const CASEFOLD    = 1 << 4;
        /// `\` and `/` are treated as equivalent separators.
        const SLASHFOLD   = 1 << 5;
        /// `**` crosses separators; implies PATHNAME.
        const WILDSTAR    = 1 << 6;
    }
}

fn is_sep(flags: WildFlags, c: char) -> bool {
    c == '/' || (flags.contains(WildFlags::SLASHFOLD) && c == '\\')
}

fn fold(flags: WildFlags, c: char) -> char {
    if flags.contains(WildFlags::CASEFOLD) {
        c.to_ascii_lowercase()
    } else {
        c
    }
}

/// Collapses `/**/**/` runs and consecutive `**` path segments in a wildstar
/// pattern down to a single `**` segment, as required by spec §4.2.
fn collapse_wildstar(pattern: &str) -> String {
    let segs: Vec<&str> = pattern.split('/').collect();
    let mut out: Vec<&str> = Vec::with_capacity(segs.len());
    for seg in segs {
        if seg == "**" && out.last() == Some(&"**") {
            continue;
        }
        out.push(seg);
    }
    out.join("/")
}

/// Matches `path` against `pattern` under `flags`.
pub fn match_wild(pattern: &str, path: &str, flags: WildFlags) -> bool {
    let flags = if flags.contains(WildFlags::WILDSTAR) {
        flags | WildFlags::PATHNAME
    } else {
        flags
    };
    let pattern = if flags.contains(WildFlags::WILDSTAR) {
        collapse_wildstar(pattern)
    } else {
        pattern.to_string()
    };
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = path.chars().collect();
    do_match(&p, &s, flags, true)
}

fn do_match(p: &[char], s: &[char], flags: WildFlags, at_seg_start: bool) -> bool {
    match_from(p, 0, s, 0, flags, at_seg_start)
}

fn match_from(p: &[char], mut pi: usize, s: &[char], mut si: usize, flags: WildFlags, mut at_seg_start: bool) -> bool {
    loop {
        if pi == p.len() {
            if si == s.len() {
                return true;
            }
            if flags.contains(WildFlags::LEADING_DIR) && si < s.len() && is_sep(flags, s[si]) {
                return true;
            }
            return false;
        }

        // Leading-dot rule: a literal '.', '*', or '?' match against a
        // segment-initial '.' is only permitted when PERIOD is not set, or
        // the pattern itself starts that segment with a literal '.'.
        let blocked_dot = flags.contains(WildFlags::PERIOD)
            && at_seg_start
            && si < s.len()
            && s[si] == '.'
            && p[pi] != '.';

        match p[pi] {
            '*' if flags.contains(WildFlags::WILDSTAR) && p.get(pi + 1) == Some(&'*') => {
                // `**`: matches zero or more path segments (crosses separators).
                let rest = &p[pi + 2..];
                // skip an optional following separator in the pattern, it's
                // already implied by crossing segments.
                let rest = if rest.first().is_some_and(|&c| is_sep(flags, c)) {
                    &rest[1..]
                } else {
                    rest
                };
                for k in si..=s.len() {
                    if match_from(rest, 0, s, k, flags, k == 0 || is_sep(flags, s[k - 1])) {
                        return true;
                    }
                }
                return false;
            }
            '*' => {
                if blocked_dot {
                    return false;
                }
                let limit = if flags.contains(WildFlags::PATHNAME) {
                    let mut l = si;
                    while l < s.len() && !is_sep(flags, s[l]) {
                        l += 1;
                    }
                    l
                } else {
                    s.len()
                };
                for k in (si..=limit).rev() {
                    if match_from(p, pi + 1, s, k, flags, false) {
                        return true;
                    }
                }
                return false;
            }
            '?' => {
                if blocked_dot || si >= s.len() || (flags.contains(WildFlags::PATHNAME) && is_sep(flags, s[si])) {
                    return false;
                }
                si += 1;
                pi += 1;
                at_seg_start = false;
            }
            '[' if !blocked_dot => match match_bracket(p, pi, s.get(si).copied(), flags) {
                Some((consumed, true)) => {
                    pi += consumed;
                    si += 1;
                    at_seg_start = false;
                }
                Some((_, false)) => return false,
                None => {
                    // Malformed class: treat '[' literally.
                    if si < s.len() && fold(flags, s[si]) == fold(flags, '[') {
                        pi += 1;
                        si += 1;
                        at_seg_start = false;
                    } else {
                        return false;
                    }
                }
            },
            '\\' if !flags.contains(WildFlags::NOESCAPE) && pi + 1 < p.len() => {
                let esc = p[pi + 1];
                if si < s.len() && fold(flags, s[si]) == fold(flags, esc) {
                    pi += 2;
                    si += 1;
                    at_seg_start = false;
                } else {
                    return false;
                }
            }
            c => {
                if blocked_dot {
                    return false;
                }
                if si >= s.len() || fold(flags, s[si]) != fold(flags, c) {
                    return false;
                }
                at_seg_start = is_sep(flags, c);
                pi += 1;
                si += 1;
            }
        }
    }
}

/// Returns `Some((pattern_chars_consumed, matched))` for a `[...]` bracket
/// expression starting at `p[start]`, or `None` if the class is malformed
/// (no closing `]`).
fn match_bracket(p: &[char], start: usize, ch: Option<char>, flags: WildFlags) -> Option<(usize, bool)> {
    let mut i = start + 1;
    let negate = matches!(p.get(i), Some('!') | Some('^'));
    if negate {
        i += 1;
    }
    let class_start = i;
    let mut matched = false;
    let mut first = true;
    loop {
        let c = *p.get(i)?;
        if c == ']' && !first {
            break;
        }
        first = false;
        if c == '[' && p.get(i + 1) == Some(&':') {
            if let Some(end) = find_class_end(p, i) {
                let name: String = p[i + 2..end].iter().collect();
                if let Some(ch) = ch
                    && posix_class_matches(&name, ch)
                {
                    matched = true;
                }
                i = end + 2;
                continue;
            }
        }
        // range a-b
        if p.get(i + 1) == Some(&'-') && p.get(i + 2).is_some_and(|&n| n != ']') {
            let lo = fold(flags, c);
            let hi = fold(flags, p[i + 2]);
            if let Some(ch) = ch {
                let f = fold(flags, ch);
                if lo <= f && f <= hi {
                    matched = true;
                }
            }
            i += 3;
            continue;
        }
        if let Some(ch) = ch
            && fold(flags, ch) == fold(flags, c)
        {
            matched = true;
        }
        i += 1;
    }
    let _ = class_start;
    let consumed = i + 1 - start;
    let result = ch.is_some() && (matched != negate);
    Some((consumed, result))
}

fn find_class_end(p: &[char], i: usize) -> Option<usize> {
    let mut j = i + 2;
    while j + 1 < p.len() {
        if p[j] == ':' && p[j + 1] == ']' {
            return Some(j);
        }
        j += 1;
    }
    None
}

fn posix_class_matches(name: &str, c: char) -> bool {
    match name {
        "alpha" => c.is_alphabetic(),
        "digit" => c.is_ascii_digit(),
        "alnum" => c.is_alphanumeric(),
        "upper" => c.is_uppercase(),
        "lower" => c.is_lowercase(),
        "space" => c.is_whitespace(),
        "punct" => c.is_ascii_punctuation(),
        "xdigit" => c.is_ascii_hexdigit(),
        "cntrl" => c.is_control(),
        "print" => !c.is_control(),
        "graph" => !c.is_control() && !c.is_whitespace(),
        "blank" => c == ' ' || c == '\t',
        _ => false,
    }
}
