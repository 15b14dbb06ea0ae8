//! Classic match UI module (C15 UI): Tab-driven LCD append, then the
//! "display all N?" query and `--More--` pager, per spec §4.7.
//!
//! Grounded on `core-render/src/status.rs`'s segment-composition style for
//! the column layout, and `core-render/src/scheduler.rs`'s decision-DTO
//! pattern for the page/redraw bookkeeping.
//!
//! Tab's trigger condition is spec §4.7 step 2's literal one: attempt the
//! LCD append, and if the line already ends with the LCD (there is nothing
//! left to append), go straight to the query/pager instead of inserting a
//! no-op.

use clink_editor::{EditorContext, EditorModule, MatchEntry, ModuleResult, ResolvedInput};
use clink_keymap::{Binder, BinderError, GroupId};
use clink_settings::{Registry, Value};
use std::collections::VecDeque;

const TAB_ID: u8 = 1;
const QUERY_YES_ID: u8 = 2;
const PAGER_SPACE_ID: u8 = 3;
const PAGER_ENTER_ID: u8 = 4;
const PAGER_ABORT_ID: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiMode {
    Idle,
    Query,
    Pager,
}

/// Lays out `entries` into display rows. Spec §4.7: width is
/// `min(term_cols-3, match.max_width)`, columns are
/// `max(1, width / (longest+1))`; `vertical` fills columns top-to-bottom
/// before moving right (the spec's default), otherwise rows fill
/// left-to-right first.
pub fn layout_columns(entries: &[MatchEntry], term_cols: u16, max_width: usize, vertical: bool) -> Vec<String> {
    if entries.is_empty() {
        return Vec::new();
    }
    let longest = entries.iter().map(|e| e.display_text.chars().count()).max().unwrap_or(1);
    let width = (term_cols as usize).saturating_sub(3).min(max_width.max(1));
    let columns = (width / (longest + 1)).max(1);
    let rows = entries.len().div_ceil(columns);

    let mut lines = Vec::with_capacity(rows);
    for row in 0..rows {
        let mut line = String::new();
        for col in 0..columns {
            let idx = if vertical { col * rows + row } else { row * columns + col };
            let Some(entry) = entries.get(idx) else { break };
            line.push_str(&format!("{:<width$}", entry.display_text, width = longest + 1));
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

pub struct ClassicMatchUi {
    module_index: u8,
    max_width: usize,
    vertical: bool,
    query_threshold: usize,
    term_cols: u16,
    term_rows: u16,
    default_group: GroupId,
    query_group: Option<GroupId>,
    pager_group: Option<GroupId>,
    mode: UiMode,
    pages: VecDeque<Vec<String>>,
}

fn setting_int(registry: &Registry, name: &str, default: i64) -> i64 {
    match registry.get(name) {
        Some(Value::Int(v)) => *v,
        _ => default,
    }
}

fn setting_bool(registry: &Registry, name: &str, default: bool) -> bool {
    match registry.get(name) {
        Some(Value::Bool(v)) => *v,
        _ => default,
    }
}

impl ClassicMatchUi {
    pub fn new(module_index: u8, registry: &Registry) -> Self {
        Self {
            module_index,
            max_width: setting_int(registry, "match.max_width", 100).max(1) as usize,
            vertical: setting_bool(registry, "match.vertical", true),
            query_threshold: setting_int(registry, "match.query_threshold", 100).max(1) as usize,
            term_cols: 80,
            term_rows: 24,
            default_group: 0,
            query_group: None,
            pager_group: None,
            mode: UiMode::Idle,
            pages: VecDeque::new(),
        }
    }

    /// The current page of already-laid-out display lines, if the pager is
    /// active (exposed for the caller's terminal writer to render).
    pub fn current_page(&self) -> Option<&[String]> {
        self.pages.front().map(|v| v.as_slice())
    }

    fn rebuild_pages(&mut self, ctx: &EditorContext) {
        let entries: Vec<MatchEntry> = ctx.matches.iter().cloned().collect();
        let lines = layout_columns(&entries, self.term_cols, self.max_width, self.vertical);
        let page_rows = (self.term_rows as usize).saturating_sub(2).max(1);
        self.pages = lines.chunks(page_rows).map(|c| c.to_vec()).collect();
    }

    fn enter_pager(&mut self, ctx: &mut EditorContext) -> ModuleResult {
        self.mode = UiMode::Pager;
        self.rebuild_pages(ctx);
        ctx.set_bind_group(self.pager_group.expect("pager group bound"));
        ModuleResult::Redraw
    }

    fn return_to_idle(&mut self, ctx: &mut EditorContext) -> ModuleResult {
        self.mode = UiMode::Idle;
        self.pages.clear();
        ctx.set_bind_group(self.default_group);
        ModuleResult::Redraw
    }

    /// Spec §4.7 step 2: append the LCD; if the line already ends with it
    /// (nothing left to append), go straight to the query/pager.
    fn handle_tab(&mut self, ctx: &mut EditorContext) -> ModuleResult {
        if ctx.matches.is_empty() {
            return ModuleResult::Next;
        }
        if ctx.matches.len() == 1 {
            return ModuleResult::AcceptMatch(0);
        }
        let lcd = ctx.matches.lcd(ctx.compare_scope);
        let nothing_to_append = lcd.is_empty() || ctx.line.get_buffer().ends_with(lcd.as_str());
        if !nothing_to_append {
            return ModuleResult::AppendMatchLcd;
        }
        if ctx.matches.len() >= self.query_threshold {
            self.mode = UiMode::Query;
            ctx.set_bind_group(self.query_group.expect("query group bound"));
            ModuleResult::Redraw
        } else {
            self.enter_pager(ctx)
        }
    }

    fn handle_query(&mut self, input: &ResolvedInput, ctx: &mut EditorContext) -> ModuleResult {
        if input.id == QUERY_YES_ID {
            self.enter_pager(ctx)
        } else {
            self.return_to_idle(ctx)
        }
    }

    fn handle_pager(&mut self, input: &ResolvedInput, ctx: &mut EditorContext) -> ModuleResult {
        match input.id {
            PAGER_ABORT_ID => self.return_to_idle(ctx),
            PAGER_SPACE_ID => {
                self.pages.pop_front();
                if self.pages.is_empty() {
                    self.return_to_idle(ctx)
                } else {
                    ModuleResult::Redraw
                }
            }
            PAGER_ENTER_ID => {
                if let Some(page) = self.pages.front_mut() {
                    if !page.is_empty() {
                        page.remove(0);
                    }
                    if page.is_empty() {
                        self.pages.pop_front();
                    }
                }
                if self.pages.is_empty() {
                    self.return_to_idle(ctx)
                } else {
                    ModuleResult::Redraw
                }
            }
            _ => ModuleResult::Redraw,
        }
    }
}

impl EditorModule for ClassicMatchUi {
    fn name(&self) -> &'static str {
        "classic_match_ui"
    }

    fn bind_input(&mut self, binder: &mut Binder, group: GroupId) -> Result<(), BinderError> {
        self.default_group = group;
        binder.bind(group, "\t", self.module_index, TAB_ID, false)?;

        let query = binder.create_group("match_ui.query")?;
        binder.bind(query, "y", self.module_index, QUERY_YES_ID, false)?;
        binder.bind(query, "Y", self.module_index, QUERY_YES_ID, false)?;
        binder.bind_catchall(query, self.module_index)?;
        self.query_group = Some(query);

        let pager = binder.create_group("match_ui.pager")?;
        binder.bind(pager, " ", self.module_index, PAGER_SPACE_ID, false)?;
        binder.bind(pager, "\r", self.module_index, PAGER_ENTER_ID, false)?;
        binder.bind(pager, "q", self.module_index, PAGER_ABORT_ID, false)?;
        binder.bind(pager, "Q", self.module_index, PAGER_ABORT_ID, false)?;
        binder.bind(pager, "\u{3}", self.module_index, PAGER_ABORT_ID, false)?;
        binder.bind(pager, "\u{4}", self.module_index, PAGER_ABORT_ID, false)?;
        binder.bind(pager, "\u{1b}", self.module_index, PAGER_ABORT_ID, false)?;
        binder.bind_catchall(pager, self.module_index)?;
        self.pager_group = Some(pager);
        Ok(())
    }

    fn on_input(&mut self, input: &ResolvedInput, ctx: &mut EditorContext) -> ModuleResult {
        match self.mode {
            UiMode::Idle => self.handle_tab(ctx),
            UiMode::Query => self.handle_query(input, ctx),
            UiMode::Pager => self.handle_pager(input, ctx),
        }
    }

    fn on_terminal_resize(&mut self, cols: u16, rows: u16, _ctx: &mut EditorContext) {
        self.term_cols = cols;
        self.term_rows = rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clink_editor::MatchFlags;

    fn entries(names: &[&str]) -> Vec<MatchEntry> {
        names
            .iter()
            .map(|n| MatchEntry {
                match_text: n.to_string(),
                display_text: n.to_string(),
                description: String::new(),
                type_byte: 0,
                append_char: None,
                flags: MatchFlags::default(),
            })
            .collect()
    }

    #[test]
    fn layout_fits_columns_by_width() {
        let e = entries(&["aa", "bb", "cc", "dd"]);
        let lines = layout_columns(&e, 20, 100, true);
        assert!(!lines.is_empty());
        for line in &lines {
            assert!(line.len() <= 17);
        }
    }

    #[test]
    fn layout_vertical_fills_columns_before_rows() {
        let e = entries(&["a", "b", "c", "d"]);
        // width=17 longest=1 -> columns = 17/2 = 8, all on one row regardless
        // of vertical/horizontal when everything fits in one row.
        let lines = layout_columns(&e, 20, 100, true);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn single_match_accepts_immediately() {
        let registry = Registry::new();
        let mut ui = ClassicMatchUi::new(0, &registry);
        let mut ctx = EditorContext::new(&registry);
        ctx.matches.set(entries(&["only"]));
        let input = ResolvedInput { keys: vec![b'\t'], id: TAB_ID, params: Default::default() };
        assert_eq!(ui.on_input(&input, &mut ctx), ModuleResult::AcceptMatch(0));
    }

    #[test]
    fn empty_matches_passes_through() {
        let registry = Registry::new();
        let mut ui = ClassicMatchUi::new(0, &registry);
        let mut ctx = EditorContext::new(&registry);
        let input = ResolvedInput { keys: vec![b'\t'], id: TAB_ID, params: Default::default() };
        assert_eq!(ui.on_input(&input, &mut ctx), ModuleResult::Next);
    }

    #[test]
    fn tab_with_no_common_prefix_enters_pager_immediately() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut ui = ClassicMatchUi::new(0, &registry);
        ui.bind_input(&mut binder, 0).unwrap();
        let mut ctx = EditorContext::new(&registry);
        ctx.matches.set(entries(&["alpha", "beta", "gamma"]));
        let input = ResolvedInput { keys: vec![b'\t'], id: TAB_ID, params: Default::default() };
        let result = ui.on_input(&input, &mut ctx);
        assert_eq!(result, ModuleResult::Redraw);
        assert!(ui.current_page().is_some());
    }

    #[test]
    fn tab_appends_lcd_then_second_tab_with_nothing_left_enters_pager() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut ui = ClassicMatchUi::new(0, &registry);
        ui.bind_input(&mut binder, 0).unwrap();
        let mut ctx = EditorContext::new(&registry);
        ctx.matches.set(entries(&["stable", "static"]));
        let input = ResolvedInput { keys: vec![b'\t'], id: TAB_ID, params: Default::default() };
        assert_eq!(ui.on_input(&input, &mut ctx), ModuleResult::AppendMatchLcd);
        ctx.line.insert("sta");
        let result = ui.on_input(&input, &mut ctx);
        assert_eq!(result, ModuleResult::Redraw);
        assert!(ui.current_page().is_some());
    }

    #[test]
    fn tab_with_lcd_already_typed_enters_pager_on_first_press() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut ui = ClassicMatchUi::new(0, &registry);
        ui.bind_input(&mut binder, 0).unwrap();
        let mut ctx = EditorContext::new(&registry);
        ctx.line.insert("sta");
        ctx.matches.set(entries(&["stable", "static"]));
        let input = ResolvedInput { keys: vec![b'\t'], id: TAB_ID, params: Default::default() };
        let result = ui.on_input(&input, &mut ctx);
        assert_eq!(result, ModuleResult::Redraw);
        assert!(ui.current_page().is_some());
    }

    #[test]
    fn large_match_count_goes_through_query_first() {
        let mut registry = Registry::new();
        registry
            .register(clink_settings::Entry {
                name: "match.query_threshold".to_string(),
                friendly_name: "".to_string(),
                description: "".to_string(),
                default: Value::Int(2),
                current: Value::Int(2),
                enum_options: vec![],
            })
            .unwrap();
        let mut binder = Binder::new();
        let mut ui = ClassicMatchUi::new(0, &registry);
        ui.bind_input(&mut binder, 0).unwrap();
        let mut ctx = EditorContext::new(&registry);
        ctx.matches.set(entries(&["alpha", "beta", "gamma"]));
        let tab = ResolvedInput { keys: vec![b'\t'], id: TAB_ID, params: Default::default() };
        let result = ui.on_input(&tab, &mut ctx);
        assert_eq!(result, ModuleResult::Redraw);
        assert_eq!(ui.mode, UiMode::Query);
        let yes = ResolvedInput { keys: vec![b'y'], id: QUERY_YES_ID, params: Default::default() };
        let result = ui.on_input(&yes, &mut ctx);
        assert_eq!(result, ModuleResult::Redraw);
        assert_eq!(ui.mode, UiMode::Pager);
    }

    #[test]
    fn pager_abort_returns_to_idle() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut ui = ClassicMatchUi::new(0, &registry);
        ui.bind_input(&mut binder, 0).unwrap();
        let mut ctx = EditorContext::new(&registry);
        ctx.matches.set(entries(&["alpha", "beta", "gamma"]));
        let tab = ResolvedInput { keys: vec![b'\t'], id: TAB_ID, params: Default::default() };
        ui.on_input(&tab, &mut ctx);
        let abort = ResolvedInput { keys: vec![b'q'], id: PAGER_ABORT_ID, params: Default::default() };
        ui.on_input(&abort, &mut ctx);
        assert_eq!(ui.mode, UiMode::Idle);
        assert!(ui.current_page().is_none());
    }
}
