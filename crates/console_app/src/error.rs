use std::io;

use remote_console::ConsoleError;
use thiserror::Error;

/// Failures of the interactive shell around the console core.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to draw the console: {0}")]
    Draw(#[source] io::Error),

    #[error("failed to read terminal input: {0}")]
    Input(#[source] io::Error),

    #[error(transparent)]
    Console(#[from] ConsoleError),
}
