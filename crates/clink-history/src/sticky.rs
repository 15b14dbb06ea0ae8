//! Sticky history search: remembers the line last recalled from history so
//! repeated recall+edit+recall keeps walking from where the user left off
//! instead of restarting from the end every time.
//!
//! Grounded on `original_source/clink/lib/include/lib/history_db.h`'s
//! `m_prev_bash_style` sticky-search note: position is remembered per
//! editor session and cleared the moment the live line diverges from the
//! text it was recalled from.

#[derive(Debug, Clone, Default)]
pub struct StickySearch {
    anchor: Option<(usize, String)>,
}

impl StickySearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `text` was just recalled at history position `index`.
    pub fn remember(&mut self, index: usize, text: &str) {
        self.anchor = Some((index, text.to_string()));
    }

    pub fn position(&self) -> Option<usize> {
        self.anchor.as_ref().map(|(idx, _)| *idx)
    }

    /// Clears the anchor if the live line no longer matches what was last
    /// recalled there, so further edits don't resume a stale walk.
    pub fn observe_edit(&mut self, current_text: &str) {
        if let Some((_, anchored_text)) = &self.anchor {
            if anchored_text != current_text {
                self.anchor = None;
            }
        }
    }

    pub fn reset(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_position_after_recall() {
        let mut sticky = StickySearch::new();
        sticky.remember(3, "git status");
        assert_eq!(sticky.position(), Some(3));
    }

    #[test]
    fn matching_edit_preserves_position() {
        let mut sticky = StickySearch::new();
        sticky.remember(3, "git status");
        sticky.observe_edit("git status");
        assert_eq!(sticky.position(), Some(3));
    }

    #[test]
    fn diverging_edit_clears_position() {
        let mut sticky = StickySearch::new();
        sticky.remember(3, "git status");
        sticky.observe_edit("git status -v");
        assert_eq!(sticky.position(), None);
    }

    #[test]
    fn reset_clears_regardless_of_text() {
        let mut sticky = StickySearch::new();
        sticky.remember(3, "git status");
        sticky.reset();
        assert_eq!(sticky.position(), None);
    }
}
