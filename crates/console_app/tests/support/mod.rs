#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use console_app::EventSource;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

pub enum Step {
    Event(Event),
    /// Yields no events for this long.
    Pause(Duration),
    /// Yields no events until the predicate holds (or a 2s ceiling passes).
    Until(Box<dyn FnMut() -> bool>),
}

/// Replays a fixed script of terminal input, then stays idle.
#[derive(Default)]
pub struct ScriptedEvents {
    steps: VecDeque<Step>,
    pause_until: Option<Instant>,
    until_deadline: Option<Instant>,
}

impl ScriptedEvents {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl EventSource for ScriptedEvents {
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        loop {
            match self.steps.front_mut() {
                None => {
                    thread::sleep(timeout);
                    return Ok(None);
                }
                Some(Step::Pause(duration)) => {
                    let until = *self.pause_until.get_or_insert_with(|| Instant::now() + *duration);
                    if Instant::now() < until {
                        thread::sleep(timeout.min(until - Instant::now()));
                        return Ok(None);
                    }
                    self.pause_until = None;
                    self.steps.pop_front();
                }
                Some(Step::Until(predicate)) => {
                    let deadline = *self
                        .until_deadline
                        .get_or_insert_with(|| Instant::now() + Duration::from_secs(2));
                    if !predicate() && Instant::now() < deadline {
                        thread::sleep(timeout.min(Duration::from_millis(5)));
                        return Ok(None);
                    }
                    self.until_deadline = None;
                    self.steps.pop_front();
                }
                Some(Step::Event(_)) => {
                    let Some(Step::Event(event)) = self.steps.pop_front() else {
                        unreachable!("front was an event");
                    };
                    return Ok(Some(event));
                }
            }
        }
    }
}

pub fn key(code: KeyCode) -> Step {
    Step::Event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

pub fn typed(text: &str) -> Vec<Step> {
    text.chars().map(|ch| key(KeyCode::Char(ch))).collect()
}

pub fn test_terminal() -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(100, 24)).expect("test terminal")
}

pub fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}
