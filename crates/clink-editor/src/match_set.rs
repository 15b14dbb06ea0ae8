//! Match set (spec §3 "Match set"): the owned, ordered sequence of
//! completion candidates the editor is currently displaying.
//!
//! Owned by the editor rather than by `clink-match` because the ownership
//! summary names the match set among the things "the line editor
//! exclusively owns" — `clink-match` depends on `clink-editor` and
//! operates on this type through generator/LCD functions, not the reverse.

use clink_text::{CompareScope, str_compare};

/// Rendering/append-char control bits on one match (spec §3: "entries may
/// carry a type byte and flags controlling append-char/description
/// rendering").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchFlags {
    pub suppress_append_char: bool,
    pub has_description: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntry {
    pub match_text: String,
    pub display_text: String,
    pub description: String,
    pub type_byte: u8,
    pub append_char: Option<char>,
    pub flags: MatchFlags,
}

impl MatchEntry {
    pub fn simple(match_text: impl Into<String>) -> Self {
        let match_text = match_text.into();
        Self {
            display_text: match_text.clone(),
            match_text,
            description: String::new(),
            type_byte: 0,
            append_char: None,
            flags: MatchFlags::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    entries: Vec<MatchEntry>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, entries: Vec<MatchEntry>) {
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&MatchEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchEntry> {
        self.entries.iter()
    }

    /// Lowest common denominator of every match's text under `scope`, in
    /// O(N*L) (spec §3: "the LCD... is computable in O(N x L)").
    pub fn lcd(&self, scope: CompareScope) -> String {
        let mut iter = self.entries.iter();
        let Some(first) = iter.next() else {
            return String::new();
        };
        let mut lcd = first.match_text.clone();
        for entry in iter {
            let mismatch = str_compare(&lcd, &entry.match_text, scope);
            if mismatch >= 0 {
                let mut cut = mismatch as usize;
                while cut > 0 && !lcd.is_char_boundary(cut) {
                    cut -= 1;
                }
                lcd.truncate(cut);
            }
            if lcd.is_empty() {
                break;
            }
        }
        lcd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcd_of_single_match_is_itself() {
        let mut set = MatchSet::new();
        set.set(vec![MatchEntry::simple("foobar")]);
        assert_eq!(set.lcd(CompareScope::Exact), "foobar");
    }

    #[test]
    fn lcd_truncates_at_first_divergence() {
        let mut set = MatchSet::new();
        set.set(vec![
            MatchEntry::simple("foobar"),
            MatchEntry::simple("foobaz"),
            MatchEntry::simple("foobly"),
        ]);
        assert_eq!(set.lcd(CompareScope::Exact), "foob");
    }

    #[test]
    fn lcd_of_empty_set_is_empty_string() {
        let set = MatchSet::new();
        assert_eq!(set.lcd(CompareScope::Exact), "");
    }

    #[test]
    fn lcd_respects_caseless_scope() {
        let mut set = MatchSet::new();
        set.set(vec![MatchEntry::simple("Foo.txt"), MatchEntry::simple("foo.bin")]);
        assert_eq!(set.lcd(CompareScope::Caseless), "foo.");
    }
}
