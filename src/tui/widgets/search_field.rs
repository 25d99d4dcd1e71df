//! Single-line text field with a debounced commit.
//!
//! Edits are local until the text has been left alone for the debounce
//! window; [`SearchField::poll`] then hands back the new value once.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SearchField {
    content: String,
    /// Byte offset of the cursor, always on a char boundary.
    cursor: usize,
    /// Last value handed out (or synced in).
    committed: String,
    last_edit: Option<Instant>,
    debounce: Duration,
}

impl SearchField {
    pub fn new(debounce: Duration) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            committed: String::new(),
            last_edit: None,
            debounce,
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor
    }

    /// Whether an edit is waiting for the debounce window.
    pub fn is_pending(&self) -> bool {
        self.last_edit.is_some()
    }

    /// Replace the text with a value that came from elsewhere (reset, deep
    /// link). Pending edits are dropped.
    pub fn sync(&mut self, value: &str) {
        if self.committed == value && self.last_edit.is_none() {
            return;
        }
        self.content = value.to_string();
        self.cursor = self.content.len();
        self.committed = value.to_string();
        self.last_edit = None;
    }

    /// Return the edited text if it settled and differs from the committed value.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let edited = self.last_edit?;
        if now.duration_since(edited) < self.debounce {
            return None;
        }
        self.last_edit = None;
        if self.content == self.committed {
            return None;
        }
        self.committed = self.content.clone();
        Some(self.committed.clone())
    }

    // ── Editing ─────────────────────────────────────────────────────────

    pub fn insert_char(&mut self, c: char, now: Instant) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.touch(now);
    }

    pub fn backspace(&mut self, now: Instant) {
        if self.cursor == 0 {
            return;
        }
        let prev = self.prev_boundary();
        self.content.drain(prev..self.cursor);
        self.cursor = prev;
        self.touch(now);
    }

    pub fn delete(&mut self, now: Instant) {
        if self.cursor >= self.content.len() {
            return;
        }
        let next = self.next_boundary();
        self.content.drain(self.cursor..next);
        self.touch(now);
    }

    pub fn clear(&mut self, now: Instant) {
        if self.content.is_empty() {
            return;
        }
        self.content.clear();
        self.cursor = 0;
        self.touch(now);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_boundary();
    }

    pub fn move_right(&mut self) {
        self.cursor = self.next_boundary();
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    fn touch(&mut self, now: Instant) {
        self.last_edit = Some(now);
    }

    fn prev_boundary(&self) -> usize {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.content[self.cursor..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| self.cursor + i)
            .unwrap_or(self.content.len())
    }
}
