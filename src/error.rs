use std::io;

use thiserror::Error;

/// Failure to append to the display. Always fatal to the sink loop.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("display is closed")]
    Closed,

    #[error("failed to append to display: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("result sink stopped: {0}")]
    Sink(#[from] SinkError),

    #[error("result sink thread panicked")]
    SinkPanicked,
}

impl ConsoleError {
    #[must_use]
    pub fn spawn(role: &'static str, source: io::Error) -> Self {
        Self::Spawn { role, source }
    }
}
