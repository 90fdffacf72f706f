use std::sync::Arc;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};
use remote_console::{CommandInput, ConsoleEvent};

use crate::scrollback::Scrollback;

const MOUSE_SCROLL_ROWS: usize = 3;
const DEFAULT_PAGE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Execute,
    Quit,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Input => Self::Execute,
            Self::Execute => Self::Quit,
            Self::Quit => Self::Input,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Input => Self::Quit,
            Self::Execute => Self::Input,
            Self::Quit => Self::Execute,
        }
    }
}

/// Where the buttons were drawn last frame, for mouse hit-testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonAreas {
    pub execute: Rect,
    pub quit: Rect,
}

/// UI state of the shell: focus, the shared input, the result log.
///
/// Terminal events are translated here; anything that reaches the console
/// core leaves as a [`ConsoleEvent`].
pub struct App {
    title: String,
    focus: Focus,
    input: Arc<CommandInput>,
    scrollback: Scrollback,
    buttons: ButtonAreas,
    page_rows: usize,
}

impl App {
    pub fn new(title: impl Into<String>, input: Arc<CommandInput>, scrollback: Scrollback) -> Self {
        Self {
            title: title.into(),
            focus: Focus::Input,
            input,
            scrollback,
            buttons: ButtonAreas::default(),
            page_rows: DEFAULT_PAGE_ROWS,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn input(&self) -> &CommandInput {
        &self.input
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn buttons(&self) -> ButtonAreas {
        self.buttons
    }

    pub(crate) fn set_buttons(&mut self, buttons: ButtonAreas) {
        self.buttons = buttons;
    }

    pub(crate) fn set_page_rows(&mut self, rows: usize) {
        self.page_rows = rows.max(1);
    }

    pub fn handle_terminal_event(&mut self, event: &Event) -> Option<ConsoleEvent> {
        match event {
            Event::Key(key) => self.handle_key(*key),
            Event::Mouse(mouse) => self.handle_mouse(*mouse),
            Event::Paste(text) => {
                if self.focus == Focus::Input {
                    let single_line: String = text.chars().filter(|ch| *ch != '\n').collect();
                    self.input.insert_str(&single_line);
                }
                None
            }
            _ => None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<ConsoleEvent> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c' | 'q') if ctrl => return Some(ConsoleEvent::Quit),
            KeyCode::Esc => return Some(ConsoleEvent::Quit),
            KeyCode::Enter => {
                return Some(match self.focus {
                    Focus::Quit => ConsoleEvent::Quit,
                    Focus::Input | Focus::Execute => ConsoleEvent::Execute,
                });
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                return None;
            }
            KeyCode::PageUp => {
                self.scrollback.scroll_up(self.page_rows);
                return None;
            }
            KeyCode::PageDown => {
                self.scrollback.scroll_down(self.page_rows);
                return None;
            }
            _ => {}
        }

        if self.focus != Focus::Input {
            match key.code {
                KeyCode::Home => self.scrollback.scroll_to_top(),
                KeyCode::End => self.scrollback.scroll_to_bottom(),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input.insert_char(ch);
            }
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            _ => {}
        }
        None
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Option<ConsoleEvent> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let position = Position::new(mouse.column, mouse.row);
                if self.buttons.execute.contains(position) {
                    self.focus = Focus::Execute;
                    Some(ConsoleEvent::Execute)
                } else if self.buttons.quit.contains(position) {
                    self.focus = Focus::Quit;
                    Some(ConsoleEvent::Quit)
                } else {
                    None
                }
            }
            MouseEventKind::ScrollUp => {
                self.scrollback.scroll_up(MOUSE_SCROLL_ROWS);
                None
            }
            MouseEventKind::ScrollDown => {
                self.scrollback.scroll_down(MOUSE_SCROLL_ROWS);
                None
            }
            _ => None,
        }
    }
}
