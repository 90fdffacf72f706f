use std::sync::{Arc, Mutex};

use remote_console::{lock_unpoisoned, ResultSink, SinkError};

/// Append-only result log shared by the sink loop (writer) and the renderer.
///
/// Follows the tail until the operator scrolls back; `close` makes further
/// appends fail so a torn-down display stops the sink loop.
#[derive(Clone, Default)]
pub struct Scrollback {
    state: Arc<Mutex<ScrollbackState>>,
}

#[derive(Default)]
struct ScrollbackState {
    lines: Vec<String>,
    // Text after the last '\n', not yet a complete line.
    partial: String,
    // Lines between the bottom of the view and the tail. Zero follows the tail.
    offset: usize,
    closed: bool,
}

impl Scrollback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) -> Result<(), SinkError> {
        let mut state = lock_unpoisoned(&self.state);
        if state.closed {
            return Err(SinkError::Closed);
        }

        let mut segments = text.split('\n');
        if let Some(first) = segments.next() {
            state.partial.push_str(first);
        }
        let mut added = 0;
        for segment in segments {
            let complete = std::mem::replace(&mut state.partial, segment.to_string());
            state.lines.push(complete);
            added += 1;
        }
        if state.offset > 0 {
            state.offset += added;
        }
        Ok(())
    }

    /// Every complete line, oldest first.
    pub fn lines(&self) -> Vec<String> {
        lock_unpoisoned(&self.state).lines.clone()
    }

    pub fn line_count(&self) -> usize {
        lock_unpoisoned(&self.state).lines.len()
    }

    /// The lines that fit in `height` rows at the current scroll position.
    pub fn visible(&self, height: usize) -> Vec<String> {
        let mut state = lock_unpoisoned(&self.state);
        let total = state.lines.len();
        state.offset = state.offset.min(total.saturating_sub(height));

        let end = total - state.offset;
        let start = end.saturating_sub(height);
        state.lines[start..end].to_vec()
    }

    pub fn offset(&self) -> usize {
        lock_unpoisoned(&self.state).offset
    }

    pub fn is_following(&self) -> bool {
        self.offset() == 0
    }

    pub fn scroll_up(&self, rows: usize) {
        let mut state = lock_unpoisoned(&self.state);
        let max = state.lines.len();
        state.offset = state.offset.saturating_add(rows).min(max);
    }

    pub fn scroll_down(&self, rows: usize) {
        let mut state = lock_unpoisoned(&self.state);
        state.offset = state.offset.saturating_sub(rows);
    }

    pub fn scroll_to_top(&self) {
        let mut state = lock_unpoisoned(&self.state);
        state.offset = state.lines.len();
    }

    pub fn scroll_to_bottom(&self) {
        lock_unpoisoned(&self.state).offset = 0;
    }

    pub fn close(&self) {
        lock_unpoisoned(&self.state).closed = true;
    }

    pub fn is_closed(&self) -> bool {
        lock_unpoisoned(&self.state).closed
    }
}

impl ResultSink for Scrollback {
    fn append(&mut self, text: &str) -> Result<(), SinkError> {
        self.push_text(text)
    }
}
