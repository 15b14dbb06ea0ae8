//! File-system match generator: lists directory entries whose name matches
//! the fragment under the cursor, grounded on `clink_text::wild` for the
//! wildcard/case-fold semantics (spec §4.2's fnmatch-plus-wildstar matcher).

use crate::generator::{GenerateContext, MatchGenerator};
use clink_editor::{MatchEntry, MatchFlags};
use clink_text::{WildFlags, match_wild};
use std::fs;
use std::path::PathBuf;
use tracing::trace;

pub struct FileGenerator {
    pub flags: WildFlags,
}

impl FileGenerator {
    pub fn new(flags: WildFlags) -> Self {
        Self { flags }
    }
}

/// Splits `word` into its directory prefix (kept verbatim, may be empty) and
/// the trailing name fragment to match against.
fn split_dir(word: &str) -> (&str, &str) {
    match word.rfind(['/', '\\']) {
        Some(idx) => word.split_at(idx + 1),
        None => ("", word),
    }
}

fn has_wildcard(fragment: &str) -> bool {
    fragment.chars().any(|c| matches!(c, '*' | '?' | '['))
}

impl MatchGenerator for FileGenerator {
    fn generate(&self, ctx: &GenerateContext) -> Vec<MatchEntry> {
        let word = ctx.word();
        let (dir, fragment) = split_dir(word);
        let search_dir = if dir.is_empty() { PathBuf::from(".") } else { PathBuf::from(dir) };
        let pattern = if has_wildcard(fragment) {
            fragment.to_string()
        } else {
            format!("{fragment}*")
        };

        let entries = match fs::read_dir(&search_dir) {
            Ok(entries) => entries,
            Err(err) => {
                trace!(target = "match.file_generator", dir = %search_dir.display(), %err, "read_dir_failed");
                return Vec::new();
            }
        };

        let mut out: Vec<MatchEntry> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !match_wild(&pattern, &name, self.flags) {
                    return None;
                }
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let mut match_text = format!("{dir}{name}");
                if is_dir {
                    match_text.push('/');
                }
                Some(MatchEntry {
                    display_text: name,
                    match_text,
                    description: String::new(),
                    type_byte: u8::from(is_dir),
                    append_char: Some(if is_dir { '/' } else { ' ' }),
                    flags: MatchFlags { suppress_append_char: is_dir, has_description: false },
                })
            })
            .collect();
        out.sort_by(|a, b| a.match_text.cmp(&b.match_text));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_prefix_kept_and_fragment_isolated() {
        assert_eq!(split_dir("src/li"), ("src/", "li"));
        assert_eq!(split_dir("li"), ("", "li"));
    }

    #[test]
    fn wildcard_fragment_detected() {
        assert!(has_wildcard("*.rs"));
        assert!(!has_wildcard("lib"));
    }

    #[test]
    fn generates_matches_from_real_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("alpha.txt"), "").unwrap();
        fs::write(tmp.path().join("alabaster.txt"), "").unwrap();
        fs::write(tmp.path().join("beta.txt"), "").unwrap();
        let prefix = format!("{}/al", tmp.path().display());
        let ctx = GenerateContext { line: &prefix, word_start: 0, word_end: prefix.len() };
        let gen = FileGenerator::new(WildFlags::empty());
        let matches = gen.generate(&ctx);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.display_text.starts_with("al")));
    }
}
