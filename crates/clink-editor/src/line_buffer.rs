//! Line buffer (spec §3 "Line buffer"): owned UTF-8 text plus cursor byte
//! offset and a needs-redraw flag.

#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
    needs_redraw: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_buffer(&self) -> &str {
        &self.text
    }

    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.text.len());
        self.needs_redraw = true;
    }

    pub fn insert(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
        self.needs_redraw = true;
    }

    pub fn remove(&mut self, from: usize, to: usize) {
        let (from, to) = (from.min(self.text.len()), to.min(self.text.len()));
        if from >= to {
            return;
        }
        self.text.replace_range(from..to, "");
        if self.cursor > from {
            self.cursor = from.max(self.cursor.saturating_sub(to - from));
        }
        self.needs_redraw = true;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.needs_redraw = true;
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn draw(&mut self) {
        self.needs_redraw = false;
    }

    pub fn redraw(&mut self) {
        self.needs_redraw = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_advances_cursor() {
        let mut b = LineBuffer::new();
        b.insert("hi");
        assert_eq!(b.get_buffer(), "hi");
        assert_eq!(b.get_cursor(), 2);
    }

    #[test]
    fn remove_pulls_cursor_back() {
        let mut b = LineBuffer::new();
        b.insert("hello");
        b.remove(1, 3);
        assert_eq!(b.get_buffer(), "hlo");
        assert_eq!(b.get_cursor(), 1);
    }

    #[test]
    fn cursor_clamped_to_length() {
        let mut b = LineBuffer::new();
        b.insert("hi");
        b.set_cursor(99);
        assert_eq!(b.get_cursor(), 2);
    }
}
