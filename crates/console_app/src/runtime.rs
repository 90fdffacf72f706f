use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use ratatui::backend::Backend;
use ratatui::Terminal;
use remote_console::Console;

use crate::app::App;
use crate::error::AppError;
use crate::tui;

// Upper bound on one input wait so cancellation is noticed promptly.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Source of terminal events for the run loop.
pub trait EventSource {
    /// Waits up to `timeout` for the next event.
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<Event>>;
}

/// Reads events from the real terminal.
#[derive(Debug, Default)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        if event::poll(timeout)? {
            return event::read().map(Some);
        }
        Ok(None)
    }
}

/// Drives the shell until the lifecycle signal fires.
///
/// Redraws every `redraw_interval` and right after each terminal event.
/// A sink loop that died on a display error ends the loop with that error.
pub fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    console: &mut Console,
    app: &mut App,
    events: &mut dyn EventSource,
    redraw_interval: Duration,
) -> Result<(), AppError> {
    let signal = console.lifecycle().signal();
    let mut next_redraw = Instant::now();

    loop {
        if signal.is_cancelled() {
            tracing::debug!("run loop observed cancellation");
            return Ok(());
        }
        console.check_sink()?;

        if Instant::now() >= next_redraw {
            let in_flight = console.in_flight();
            terminal
                .draw(|frame| tui::render(frame, app, in_flight))
                .map_err(AppError::Draw)?;
            next_redraw = Instant::now() + redraw_interval;
        }

        let wait = next_redraw
            .saturating_duration_since(Instant::now())
            .min(INPUT_POLL);
        let Some(event) = events.next_event(wait).map_err(AppError::Input)? else {
            continue;
        };

        if let Some(action) = app.handle_terminal_event(&event) {
            let outcome = console.handle_event(action)?;
            tracing::debug!(?action, ?outcome, "console event handled");
        }
        next_redraw = Instant::now();
    }
}
