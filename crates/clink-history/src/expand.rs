//! History expansion (`!!`, `!N`, `!string`, word designators, `:s///`
//! substitution), spec §4.8's `expand(line, out)`.
//!
//! Readline itself implements this in the original program; there is no
//! Rust-reachable source to ground line-by-line, so this follows the rules
//! spec.md states directly, matching Readline's documented return-value
//! convention (`error(-1)`, `none(0)`, `ok(1)`, `print(2)`).

use crate::store::HistoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandResult {
    Error,
    None,
    Ok,
    /// Expanded, but the caller should show the result and ask for
    /// confirmation before executing it (a bare `!N` etc. with no other
    /// text on the line).
    Print,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandMode {
    Off,
    On,
    NotInSingleQuotes,
    NotInDoubleQuotes,
    NotInEitherQuote,
}

impl ExpandMode {
    pub fn from_setting_value(v: i32) -> Self {
        match v {
            0 => ExpandMode::Off,
            2 => ExpandMode::NotInSingleQuotes,
            3 => ExpandMode::NotInDoubleQuotes,
            4 => ExpandMode::NotInEitherQuote,
            _ => ExpandMode::On,
        }
    }
}

fn find_event(store: &HistoryStore, spec: &str, current_line: &str) -> Option<String> {
    if spec == "!" {
        return store.read_lines().last().map(|(_, t, _)| t.to_string());
    }
    if spec == "#" {
        return Some(current_line.to_string());
    }
    if let Some(rest) = spec.strip_prefix('-') {
        if let Ok(n) = rest.parse::<usize>() {
            let lines: Vec<&str> = store.read_lines().map(|(_, t, _)| t).collect();
            let idx = lines.len().checked_sub(n)?;
            return lines.get(idx).map(|s| s.to_string());
        }
    }
    if let Ok(n) = spec.parse::<usize>() {
        // 1-based absolute index, assigned in insertion order.
        return store.read_lines().nth(n.checked_sub(1)?).map(|(_, t, _)| t.to_string());
    }
    if let Some(needle) = spec.strip_prefix('?') {
        let needle = needle.strip_suffix('?').unwrap_or(needle);
        return store.read_lines().rev().map(|(_, t, _)| t).find(|t| t.contains(needle)).map(|s| s.to_string());
    }
    store.read_lines().rev().map(|(_, t, _)| t).find(|t| t.starts_with(spec)).map(|s| s.to_string())
}

/// Applies a `:N`, `:$`, `:N-$`, `:N*`, `:-N` word designator to `event`.
fn apply_word_designator(event: &str, designator: &str) -> Option<String> {
    let words: Vec<&str> = event.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    if designator == "$" {
        return words.last().map(|s| s.to_string());
    }
    if designator == "*" {
        return Some(words[1.min(words.len() - 1)..].join(" "));
    }
    if let Some(n) = designator.strip_suffix("-$") {
        let n: usize = n.parse().ok()?;
        return Some(words.get(n..)?.join(" "));
    }
    if let Some(n) = designator.strip_suffix('*') {
        let n: usize = n.parse().ok()?;
        return Some(words.get(n..)?.join(" "));
    }
    if let Some(n) = designator.strip_prefix('-') {
        let n: usize = n.parse().ok()?;
        let idx = words.len().checked_sub(n + 1)?;
        return words.get(idx).map(|s| s.to_string());
    }
    let n: usize = designator.parse().ok()?;
    words.get(n).map(|s| s.to_string())
}

/// Applies a `:s/X/Y/` (anchored, first match only) substitution.
fn apply_substitute(text: &str, spec: &str) -> Option<String> {
    let body = spec.strip_prefix("s/")?;
    let mut parts = body.splitn(3, '/');
    let from = parts.next()?;
    let to = parts.next()?;
    if from.is_empty() {
        return Some(text.to_string());
    }
    text.find(from).map(|idx| {
        let mut out = String::with_capacity(text.len());
        out.push_str(&text[..idx]);
        out.push_str(to);
        out.push_str(&text[idx + from.len()..]);
        out
    })
}

/// Expands the next `!...` event reference (plus any trailing `:designator`
/// / `:s///` chain) starting at `bang` in `line`. Returns the expanded text
/// and how many bytes of `line` were consumed.
fn expand_one(store: &HistoryStore, line: &str, bang: usize, current_line: &str) -> Option<(String, usize)> {
    let rest = &line[bang + 1..];
    let event_end = rest
        .char_indices()
        .find(|&(_, c)| c.is_whitespace() || c == '!' || c == ':')
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let event_spec = &rest[..event_end];
    if event_spec.is_empty() && !rest.starts_with('!') {
        return None;
    }
    let spec = if rest.starts_with('!') { "!" } else { event_spec };
    let event = find_event(store, spec, current_line)?;
    let mut consumed = 1 + spec.len();

    let mut result = event;
    let mut cursor = &rest[spec.len()..];
    while let Some(tail) = cursor.strip_prefix(':') {
        let seg_end = tail
            .char_indices()
            .find(|&(_, c)| c == ':' || c.is_whitespace())
            .map(|(i, _)| i)
            .unwrap_or(tail.len());
        let seg = &tail[..seg_end];
        let applied = if seg.starts_with("s/") {
            apply_substitute(&result, seg)
        } else {
            apply_word_designator(&result, seg)
        };
        let Some(applied) = applied else { break };
        result = applied;
        consumed += 1 + seg_end;
        cursor = &tail[seg_end..];
    }

    Some((result, consumed))
}

/// `^X^Y^` shorthand: substitute on the previous command. Only recognised
/// at the very start of the line, equivalent to `!!:s/X/Y/`.
fn expand_caret_shorthand(store: &HistoryStore, line: &str) -> Option<String> {
    let rest = line.strip_prefix('^')?;
    let mut segs = rest.splitn(2, '^');
    let from = segs.next()?;
    let to_and_tail = segs.next()?;
    let to_end = to_and_tail.find('^').unwrap_or(to_and_tail.len());
    let to = &to_and_tail[..to_end];
    let prev = store.read_lines().next_back()?.1;
    Some(if from.is_empty() { prev.to_string() } else { prev.replacen(from, to, 1) })
}

/// Spec §4.8 `expand(line, out)`.
pub fn expand(store: &HistoryStore, line: &str, mode: ExpandMode) -> (ExpandResult, String) {
    if mode == ExpandMode::Off {
        return (ExpandResult::None, line.to_string());
    }
    if line.starts_with('^') {
        if let Some(expanded) = expand_caret_shorthand(store, line) {
            return (ExpandResult::Ok, expanded);
        }
    }
    if !line.contains('!') {
        return (ExpandResult::None, line.to_string());
    }

    let mut out = String::with_capacity(line.len());
    let mut changed = false;
    let mut in_single = false;
    let mut in_double = false;
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = line[i..].chars().next().unwrap();
        if c == '\'' && !in_double {
            in_single = !in_single;
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        if c == '"' && !in_single {
            in_double = !in_double;
            out.push(c);
            i += c.len_utf8();
            continue;
        }
        let quoted_blocked = match mode {
            ExpandMode::NotInSingleQuotes => in_single,
            ExpandMode::NotInDoubleQuotes => in_double,
            ExpandMode::NotInEitherQuote => in_single || in_double,
            _ => false,
        };
        if c == '!' && !quoted_blocked {
            if let Some((expanded, consumed)) = expand_one(store, line, i, &out) {
                out.push_str(&expanded);
                i += consumed;
                changed = true;
                continue;
            }
        }
        out.push(c);
        i += c.len_utf8();
    }

    if !changed {
        return (ExpandResult::None, line.to_string());
    }
    if out.trim() != line.trim() && line.trim().starts_with('!') && !line.trim()[1..].contains(char::is_whitespace) {
        return (ExpandResult::Print, out);
    }
    (ExpandResult::Ok, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clink_settings::Registry;

    fn store_with(lines: &[&str]) -> HistoryStore {
        let registry = Registry::new();
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::new(dir.path().join("history"), &registry, true);
        std::mem::forget(dir);
        for l in lines {
            store.add(l);
        }
        store
    }

    #[test]
    fn no_bang_is_a_no_op() {
        let store = store_with(&["ls -la"]);
        let (result, text) = expand(&store, "echo hi", ExpandMode::On);
        assert_eq!(result, ExpandResult::None);
        assert_eq!(text, "echo hi");
    }

    #[test]
    fn bang_bang_repeats_previous() {
        let store = store_with(&["git status"]);
        let (result, text) = expand(&store, "!!", ExpandMode::On);
        assert_eq!(result, ExpandResult::Print);
        assert_eq!(text, "git status");
    }

    #[test]
    fn bang_n_is_absolute_index() {
        let store = store_with(&["first", "second", "third"]);
        let (_, text) = expand(&store, "!1", ExpandMode::On);
        assert_eq!(text, "first");
    }

    #[test]
    fn bang_string_finds_most_recent_prefix_match() {
        let store = store_with(&["git add .", "git commit -m x", "ls"]);
        let (_, text) = expand(&store, "!git", ExpandMode::On);
        assert_eq!(text, "git commit -m x");
    }

    #[test]
    fn word_designator_last_word() {
        let store = store_with(&["cp a.txt b.txt"]);
        let (_, text) = expand(&store, "!!:$", ExpandMode::On);
        assert_eq!(text, "b.txt");
    }

    #[test]
    fn substitute_modifier_replaces_first_match() {
        let store = store_with(&["cat foo.txt"]);
        let (_, text) = expand(&store, "!!:s/foo/bar/", ExpandMode::On);
        assert_eq!(text, "cat bar.txt");
    }

    #[test]
    fn caret_shorthand_substitutes_on_previous() {
        let store = store_with(&["cat foo.txt"]);
        let (_, text) = expand(&store, "^foo^bar^", ExpandMode::On);
        assert_eq!(text, "cat bar.txt");
    }

    #[test]
    fn mode_off_never_expands() {
        let store = store_with(&["git status"]);
        let (result, text) = expand(&store, "!!", ExpandMode::Off);
        assert_eq!(result, ExpandResult::None);
        assert_eq!(text, "!!");
    }

    #[test]
    fn single_quoted_bang_skipped_in_not_squoted_mode() {
        let store = store_with(&["git status"]);
        let (result, text) = expand(&store, "echo '!!'", ExpandMode::NotInSingleQuotes);
        assert_eq!(result, ExpandResult::None);
        assert_eq!(text, "echo '!!'");
    }
}
