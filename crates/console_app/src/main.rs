use std::io;
use std::sync::Arc;

use anyhow::Context;
use console_app::platform::{self, TerminalGuard};
use console_app::{executor_from_config, run_loop, App, CrosstermEvents, Scrollback};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use remote_console::{logging, Console, ConsoleConfig};

fn main() -> anyhow::Result<()> {
    let config = ConsoleConfig::from_env().context("failed to load configuration")?;
    logging::init(config.log_path.as_deref()).context("failed to open log file")?;
    tracing::info!(executor = config.executor.as_str(), "starting remote console");

    let executor = executor_from_config(&config).context("failed to start remote session")?;
    let title = executor.profile().target;

    let mut guard = TerminalGuard::enter().context("failed to set up terminal")?;
    platform::install_panic_hook();
    let mut terminal =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("failed to set up terminal")?;

    let scrollback = Scrollback::new();
    let mut console =
        Console::start(executor, scrollback.clone()).context("failed to start console")?;
    let signals = platform::install_quit_signals(console.lifecycle().clone())
        .context("failed to install signal handlers")?;

    let mut app = App::new(title, Arc::clone(console.input()), scrollback.clone());
    let outcome = run_loop(
        &mut terminal,
        &mut console,
        &mut app,
        &mut CrosstermEvents,
        config.redraw_interval,
    );

    scrollback.close();
    drop(signals);
    let restored = guard.restore();
    let report = console.shutdown(config.shutdown_grace);
    tracing::info!(?report, "remote console stopped");

    outcome.context("console stopped with an error")?;
    restored.context("failed to restore terminal")?;
    report.context("failed to shut down console")?;
    Ok(())
}
