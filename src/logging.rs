//! File-backed `tracing` setup.
//!
//! The terminal belongs to the UI, so log output only ever goes to a file.
//! Without a configured path no subscriber is installed and events are dropped.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the global subscriber writing to `log_path`.
///
/// Returns `Ok(false)` when no path is configured. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init(log_path: Option<&Path>) -> io::Result<bool> {
    let Some(log_path) = log_path else {
        return Ok(false);
    };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(Mutex::new(log_file))
        .try_init()
        .map_err(io::Error::other)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_installs_nothing() {
        assert!(!init(None).expect("no-op init"));
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let error = init(Some(Path::new("/nonexistent-dir/remote-console.log")))
            .expect_err("missing directory");
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
