//! Process-level terminal hygiene: raw mode and the alternate screen, quit
//! signals, and a panic hook that puts the terminal back first.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use crossterm::cursor::Show;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use remote_console::LifecycleController;
use signal_hook::iterator::{Handle, Signals};

/// Signals that request the same shutdown as the Quit action.
pub const QUIT_SIGNALS: [i32; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP];

/// Owns raw mode and the alternate screen; restores both when dropped.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self { active: true };
        if let Err(error) = execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        ) {
            let _ = guard.restore();
            return Err(error);
        }
        Ok(guard)
    }

    pub fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        restore_terminal()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Best-effort: leaves the alternate screen and raw mode. Safe to repeat.
pub fn restore_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    let screen = execute!(
        stdout,
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen,
        Show
    );
    let raw = disable_raw_mode();
    let _ = stdout.flush();
    screen.and(raw)
}

/// Restores the terminal before the previous hook prints the panic.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        previous(info);
    }));
}

/// Quit-signal listener; stops listening when dropped.
pub struct SignalGuard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Triggers `lifecycle` on SIGINT, SIGTERM or SIGHUP.
pub fn install_quit_signals(lifecycle: LifecycleController) -> io::Result<SignalGuard> {
    let mut signals = Signals::new(QUIT_SIGNALS)?;
    let handle = signals.handle();

    let thread = thread::Builder::new()
        .name("remote-console-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                if lifecycle.trigger() {
                    tracing::info!(signal, "quit requested by signal");
                }
            }
        })?;

    Ok(SignalGuard {
        handle,
        thread: Some(thread),
    })
}
