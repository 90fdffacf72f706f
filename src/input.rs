//! Single-line command input shared between the key handler and the dispatcher.

use std::sync::{Mutex, MutexGuard};

use remote_exec::lock_unpoisoned;

#[derive(Debug, Default)]
struct InputState {
    text: String,
    // Cursor position in chars, `0..=text.chars().count()`.
    cursor: usize,
}

impl InputState {
    fn byte_index(&self, cursor: usize) -> usize {
        self.text
            .char_indices()
            .nth(cursor)
            .map(|(index, _)| index)
            .unwrap_or(self.text.len())
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Editable command text with an atomic read-and-clear.
#[derive(Debug, Default)]
pub struct CommandInput {
    state: Mutex<InputState>,
}

impl CommandInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the current text and leaves the input empty, under one lock.
    ///
    /// A second call without new edits returns an empty string.
    pub fn read_and_clear(&self) -> String {
        let mut state = self.lock();
        state.cursor = 0;
        std::mem::take(&mut state.text)
    }

    /// Current text and cursor (in chars), for rendering.
    pub fn snapshot(&self) -> (String, usize) {
        let state = self.lock();
        (state.text.clone(), state.cursor)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().text.is_empty()
    }

    pub fn insert_char(&self, ch: char) {
        let mut state = self.lock();
        let index = state.byte_index(state.cursor);
        state.text.insert(index, ch);
        state.cursor += 1;
    }

    pub fn insert_str(&self, text: &str) {
        let mut state = self.lock();
        let index = state.byte_index(state.cursor);
        state.text.insert_str(index, text);
        state.cursor += text.chars().count();
    }

    /// Deletes the char before the cursor.
    pub fn backspace(&self) {
        let mut state = self.lock();
        if state.cursor == 0 {
            return;
        }
        state.cursor -= 1;
        let index = state.byte_index(state.cursor);
        state.text.remove(index);
    }

    /// Deletes the char under the cursor.
    pub fn delete(&self) {
        let mut state = self.lock();
        if state.cursor >= state.char_count() {
            return;
        }
        let index = state.byte_index(state.cursor);
        state.text.remove(index);
    }

    pub fn move_left(&self) {
        let mut state = self.lock();
        state.cursor = state.cursor.saturating_sub(1);
    }

    pub fn move_right(&self) {
        let mut state = self.lock();
        state.cursor = (state.cursor + 1).min(state.char_count());
    }

    pub fn move_home(&self) {
        self.lock().cursor = 0;
    }

    pub fn move_end(&self) {
        let mut state = self.lock();
        state.cursor = state.char_count();
    }

    fn lock(&self) -> MutexGuard<'_, InputState> {
        lock_unpoisoned(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_clear_consumes_text_exactly_once() {
        let input = CommandInput::new();
        input.insert_str("uname -a");

        assert_eq!(input.read_and_clear(), "uname -a");
        assert_eq!(input.read_and_clear(), "");
        assert!(input.is_empty());
        assert_eq!(input.snapshot(), (String::new(), 0));
    }

    #[test]
    fn edits_follow_the_cursor() {
        let input = CommandInput::new();
        input.insert_str("ls /tmp");
        input.move_home();
        input.move_right();
        input.move_right();
        input.insert_str(" -la");
        assert_eq!(input.snapshot(), ("ls -la /tmp".to_string(), 6));

        input.move_end();
        input.backspace();
        input.move_home();
        input.delete();
        assert_eq!(input.snapshot(), ("s -la /tm".to_string(), 0));
    }

    #[test]
    fn multibyte_chars_are_edited_by_char() {
        let input = CommandInput::new();
        input.insert_str("echo héllo");
        input.move_left();
        input.move_left();
        input.move_left();
        input.backspace();
        assert_eq!(input.snapshot(), ("echo hllo".to_string(), 6));
    }

    #[test]
    fn cursor_moves_are_clamped() {
        let input = CommandInput::new();
        input.move_left();
        input.backspace();
        input.delete();
        input.insert_char('x');
        input.move_right();
        input.move_right();
        assert_eq!(input.snapshot(), ("x".to_string(), 1));
    }
}
