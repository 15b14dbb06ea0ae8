//! Match generator trait (spec §4.7's "match.*" pipeline feeds the classic
//! UI module a `MatchSet`; a generator is anything that can produce one for
//! the word under the cursor).

use clink_editor::MatchEntry;

/// The word being completed, as a byte-offset slice of the full line.
pub struct GenerateContext<'a> {
    pub line: &'a str,
    pub word_start: usize,
    pub word_end: usize,
}

impl<'a> GenerateContext<'a> {
    pub fn word(&self) -> &'a str {
        &self.line[self.word_start..self.word_end]
    }
}

pub trait MatchGenerator {
    fn generate(&self, ctx: &GenerateContext) -> Vec<MatchEntry>;
}
