//! Scroller module (C18): a private bind group that turns Up/Down/PageUp/
//! PageDown into scrollback-window movement instead of line-editing
//! commands, entered via PageUp and left via Enter/Escape/`q`.

use crate::viewport::Viewport;
use clink_editor::{EditorContext, EditorModule, ModuleResult, ResolvedInput};
use clink_keymap::{Binder, BinderError, GroupId};

const ENTER_ID: u8 = 1;
const LINE_UP_ID: u8 = 2;
const LINE_DOWN_ID: u8 = 3;
const PAGE_UP_ID: u8 = 4;
const PAGE_DOWN_ID: u8 = 5;
const EXIT_ID: u8 = 6;

pub struct Scroller {
    module_index: u8,
    default_group: GroupId,
    scroll_group: Option<GroupId>,
    viewport: Viewport,
    total_lines: usize,
    active: bool,
}

impl Scroller {
    pub fn new(module_index: u8) -> Self {
        Self {
            module_index,
            default_group: 0,
            scroll_group: None,
            viewport: Viewport::new(0, 24),
            total_lines: 0,
            active: false,
        }
    }

    /// Tells the scroller how many lines of scrollback exist and how many
    /// screen rows are available to show them in; called on resize and
    /// whenever the host writes new output.
    pub fn set_buffer_size(&mut self, total_lines: usize, visible_rows: usize) {
        self.total_lines = total_lines;
        self.viewport.height = visible_rows.max(1);
        self.viewport.clamp(self.total_lines);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn first_visible_line(&self) -> usize {
        self.viewport.first_line
    }

    fn exit(&mut self) -> ModuleResult {
        self.active = false;
        self.viewport.first_line = self.total_lines.saturating_sub(self.viewport.height);
        // Restore the group pushed by the entering `set_bind_group` call via
        // `Pass` rather than another `set_bind_group`, so the context's
        // group stack gets popped instead of growing by one per visit.
        ModuleResult::Pass
    }
}

impl EditorModule for Scroller {
    fn name(&self) -> &'static str {
        "scroller"
    }

    fn bind_input(&mut self, binder: &mut Binder, group: GroupId) -> Result<(), BinderError> {
        self.default_group = group;
        binder.bind(group, "\\e[5~", self.module_index, ENTER_ID, false)?;

        let scroll = binder.create_group("scroller.active")?;
        binder.bind(scroll, "\\e[A", self.module_index, LINE_UP_ID, false)?;
        binder.bind(scroll, "\\e[B", self.module_index, LINE_DOWN_ID, false)?;
        binder.bind(scroll, "\\e[5~", self.module_index, PAGE_UP_ID, false)?;
        binder.bind(scroll, "\\e[6~", self.module_index, PAGE_DOWN_ID, false)?;
        binder.bind(scroll, "\r", self.module_index, EXIT_ID, false)?;
        binder.bind(scroll, "q", self.module_index, EXIT_ID, false)?;
        binder.bind(scroll, "\\e", self.module_index, EXIT_ID, false)?;
        binder.bind_catchall(scroll, self.module_index)?;
        self.scroll_group = Some(scroll);
        Ok(())
    }

    fn on_input(&mut self, input: &ResolvedInput, ctx: &mut EditorContext) -> ModuleResult {
        if !self.active {
            self.active = true;
            ctx.set_bind_group(self.scroll_group.expect("scroller group bound"));
            return ModuleResult::Redraw;
        }

        match input.id {
            LINE_UP_ID => {
                self.viewport.scroll_up(1);
                ModuleResult::Redraw
            }
            LINE_DOWN_ID => {
                self.viewport.scroll_down(1, self.total_lines);
                ModuleResult::Redraw
            }
            PAGE_UP_ID => {
                self.viewport.page_up();
                ModuleResult::Redraw
            }
            PAGE_DOWN_ID => {
                self.viewport.page_down(self.total_lines);
                ModuleResult::Redraw
            }
            EXIT_ID => self.exit(),
            _ => ModuleResult::Next,
        }
    }

    fn on_terminal_resize(&mut self, cols: u16, rows: u16, _ctx: &mut EditorContext) {
        let _ = cols;
        self.set_buffer_size(self.total_lines, rows as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clink_settings::Registry;

    #[test]
    fn first_page_up_enters_scroll_mode_without_moving() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut scroller = Scroller::new(0);
        scroller.bind_input(&mut binder, 0).unwrap();
        scroller.set_buffer_size(100, 20);
        let mut ctx = EditorContext::new(&registry);
        let input = ResolvedInput { keys: vec![0x1b, b'[', b'5', b'~'], id: ENTER_ID, params: Default::default() };
        assert_eq!(scroller.on_input(&input, &mut ctx), ModuleResult::Redraw);
        assert!(scroller.is_active());
    }

    #[test]
    fn page_up_then_down_moves_viewport() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut scroller = Scroller::new(0);
        scroller.bind_input(&mut binder, 0).unwrap();
        scroller.set_buffer_size(100, 20);
        let mut ctx = EditorContext::new(&registry);
        let enter = ResolvedInput { keys: vec![0x1b, b'[', b'5', b'~'], id: ENTER_ID, params: Default::default() };
        scroller.on_input(&enter, &mut ctx);

        let page_up = ResolvedInput { keys: vec![0x1b, b'[', b'5', b'~'], id: PAGE_UP_ID, params: Default::default() };
        scroller.on_input(&page_up, &mut ctx);
        assert!(scroller.first_visible_line() < 80);
    }

    #[test]
    fn exit_restores_default_group_and_jumps_to_bottom() {
        let registry = Registry::new();
        let mut binder = Binder::new();
        let mut scroller = Scroller::new(0);
        scroller.bind_input(&mut binder, 0).unwrap();
        scroller.set_buffer_size(100, 20);
        let mut ctx = EditorContext::new(&registry);
        let enter = ResolvedInput { keys: vec![0x1b, b'[', b'5', b'~'], id: ENTER_ID, params: Default::default() };
        scroller.on_input(&enter, &mut ctx);
        let page_up = ResolvedInput { keys: vec![0x1b, b'[', b'5', b'~'], id: PAGE_UP_ID, params: Default::default() };
        scroller.on_input(&page_up, &mut ctx);

        let exit = ResolvedInput { keys: vec![b'q'], id: EXIT_ID, params: Default::default() };
        let result = scroller.on_input(&exit, &mut ctx);
        assert_eq!(result, ModuleResult::Pass);
        assert!(!scroller.is_active());
        assert_eq!(scroller.first_visible_line(), 80);
    }
}
