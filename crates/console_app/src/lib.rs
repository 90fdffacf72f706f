//! Terminal shell for the remote command console.
//!
//! Wires the `remote_console` core to a `ratatui` + `crossterm` terminal and
//! to an executor chosen at startup (`REMOTE_CONSOLE_EXECUTOR`):
//!
//! - `ssh` (default): `remote_exec_ssh`, configured by `REMOTE_CONSOLE_HOST`,
//!   `REMOTE_CONSOLE_USER`, `REMOTE_CONSOLE_PORT` and `REMOTE_CONSOLE_PASSWORD`
//!   or `REMOTE_CONSOLE_KEY_PATH` / `REMOTE_CONSOLE_KEY_PASSPHRASE`.
//! - `local`: `sh -c` on this host.
//! - `mock`: echoes the command back.
//!
//! `REMOTE_CONSOLE_CONFIG_PATH` may point at a JSON file with the same fields;
//! environment values win. Set `REMOTE_CONSOLE_LOG_PATH` to get a log file.

pub mod app;
pub mod error;
pub mod executors;
pub mod platform;
pub mod runtime;
pub mod scrollback;
pub mod tui;

pub use crate::app::{App, ButtonAreas, Focus};
pub use crate::error::AppError;
pub use crate::executors::{executor_from_config, LocalShellExecutor};
pub use crate::runtime::{run_loop, CrosstermEvents, EventSource};
pub use crate::scrollback::Scrollback;
