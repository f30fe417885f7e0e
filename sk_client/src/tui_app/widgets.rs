use ratatui::widgets::{ListItem, ListState, ScrollbarState};
use std::collections::VecDeque;

/// Bounded list drawn bottom-to-top; index 0 is the newest item.
pub struct ScrollableList {
    max_items: usize,
    pub list_items: VecDeque<ListItem<'static>>,
    pub list_state: ListState,
    pub scroll_state: ScrollbarState,
}

impl ScrollableList {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items: max_items.max(1),
            list_items: VecDeque::new(),
            list_state: ListState::default(),
            scroll_state: ScrollbarState::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.list_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list_items.is_empty()
    }

    /// Add an item as the newest and follow it; the oldest item is dropped
    /// once the list is full
    pub fn push(&mut self, item: ListItem<'static>) {
        self.list_items.push_front(item);
        self.list_items.truncate(self.max_items);
        self.jump_to_last();
    }

    /// Oldest item
    pub fn jump_to_first(&mut self) {
        self.select(self.len().saturating_sub(1));
    }

    /// Newest item
    pub fn jump_to_last(&mut self) {
        self.select(0);
    }

    pub fn move_up(&mut self) {
        let idx = self.list_state.selected().unwrap_or(0);
        self.select((idx + 1).min(self.len().saturating_sub(1)));
    }

    pub fn move_down(&mut self) {
        let idx = self.list_state.selected().unwrap_or(0);
        self.select(idx.saturating_sub(1));
    }

    fn select(&mut self, idx: usize) {
        if self.is_empty() {
            self.list_state.select(None);
            self.scroll_state = ScrollbarState::default();
            return;
        }
        self.list_state.select(Some(idx));
        self.scroll_state = ScrollbarState::new(self.len()).position(self.len() - 1 - idx);
    }
}

/// Single-line input with a character cursor.
#[derive(Debug, Default)]
pub struct UserInput {
    pub value: String,
    /// Cursor position in characters
    pub char_idx: usize,
}

impl UserInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn byte_idx(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.char_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    pub fn input(&mut self, c: char) {
        let idx = self.byte_idx();
        self.value.insert(idx, c);
        self.char_idx += 1;
    }

    /// Insert a whole string at the cursor
    pub fn insert_str(&mut self, s: &str) {
        let s: String = s.chars().filter(|c| !c.is_control()).collect();
        let idx = self.byte_idx();
        self.value.insert_str(idx, &s);
        self.char_idx += s.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.char_idx == 0 {
            return;
        }
        self.char_idx -= 1;
        let idx = self.byte_idx();
        self.value.remove(idx);
    }

    pub fn delete(&mut self) {
        if self.char_idx < self.char_count() {
            let idx = self.byte_idx();
            self.value.remove(idx);
        }
    }

    pub fn move_left(&mut self) {
        self.char_idx = self.char_idx.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.char_idx = (self.char_idx + 1).min(self.char_count());
    }

    pub fn jump_to_first(&mut self) {
        self.char_idx = 0;
    }

    pub fn jump_to_last(&mut self) {
        self.char_idx = self.char_count();
    }

    /// Take the current value and clear the input
    pub fn submit(&mut self) -> String {
        self.char_idx = 0;
        std::mem::take(&mut self.value)
    }
}
