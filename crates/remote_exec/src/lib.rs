//! Minimal executor-agnostic contract for running one shell command on a
//! remote session.
//!
//! This crate defines only the synchronous run contract, the executor identity
//! used for display, and the error taxonomy shared by executors. It excludes
//! transport details, authentication, and any dispatch or display concerns.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;

/// Error returned while constructing/connecting an executor before any command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorInitError {
    message: String,
}

impl ExecutorInitError {
    /// Creates a new executor initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExecutorInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExecutorInitError {}

impl From<String> for ExecutorInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ExecutorInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Failure of a single command run.
///
/// `Display` renders only the human-readable description; it is shown to the
/// operator verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// Failure reported by the remote side or the executor, already phrased for display.
    #[error("{0}")]
    Remote(String),

    /// The command ran but exited unsuccessfully. `output` holds whatever it printed.
    #[error("process exited with status {code}")]
    ExitStatus { code: i32, output: String },

    /// The command did not finish within the executor's timeout.
    #[error("command timed out after {}s", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    /// The command text was empty.
    #[error("command is empty")]
    EmptyCommand,

    /// The session was closed before or during the run.
    #[error("session is closed")]
    SessionClosed,
}

impl ExecError {
    /// Builds a [`ExecError::Remote`] from any message.
    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}

impl From<String> for ExecError {
    fn from(message: String) -> Self {
        Self::Remote(message)
    }
}

impl From<&str> for ExecError {
    fn from(message: &str) -> Self {
        Self::Remote(message.to_string())
    }
}

/// Immutable metadata describing an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorProfile {
    /// Stable executor kind identifier (`ssh`, `local`, `mock`, ...).
    pub executor_id: String,
    /// Display label for the session target, e.g. `user@host:22`.
    pub target: String,
}

impl ExecutorProfile {
    #[must_use]
    pub fn new(executor_id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            executor_id: executor_id.into(),
            target: target.into(),
        }
    }
}

/// Executor interface for running one command to completion on a shared session.
///
/// Implementations own a single session. `run` may be called from several
/// threads at once; an implementation whose session cannot run concurrent
/// commands must serialize calls internally.
pub trait RemoteExecutor: Send + Sync + 'static {
    /// Returns executor identity metadata.
    fn profile(&self) -> ExecutorProfile;

    /// Runs `command` and blocks until it completes, fails, or times out.
    fn run(&self, command: &str) -> Result<String, ExecError>;

    /// Releases the session. Calling it more than once is a no-op.
    fn close(&self) -> Result<(), ExecError> {
        Ok(())
    }
}

/// Locks `mutex`, recovering the guard if a previous holder panicked.
///
/// Every lock in the workspace guards plain data that stays consistent across
/// a panic, so poisoning is not treated as an error.
pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn remote_error_displays_message_verbatim() {
        assert_eq!(
            ExecError::remote("connection reset").to_string(),
            "connection reset"
        );
        assert_eq!(ExecError::from("boom").to_string(), "boom");
    }

    #[test]
    fn structured_errors_have_readable_descriptions() {
        let exit = ExecError::ExitStatus {
            code: 2,
            output: "ls: cannot access".to_string(),
        };
        assert_eq!(exit.to_string(), "process exited with status 2");

        let timeout = ExecError::TimedOut {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(timeout.to_string(), "command timed out after 30s");
        assert_eq!(ExecError::EmptyCommand.to_string(), "command is empty");
    }

    #[test]
    fn init_error_keeps_message() {
        let error = ExecutorInitError::from("authentication failed");
        assert_eq!(error.message(), "authentication failed");
        assert_eq!(error.to_string(), "authentication failed");
    }

    #[test]
    fn poisoned_lock_still_yields_the_data() {
        let shared = Arc::new(Mutex::new(vec![1]));
        let poisoner = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let mut guard = shared.lock().expect("first lock");
                guard.push(2);
                panic!("poison the lock");
            })
        };
        assert!(poisoner.join().is_err());
        assert!(shared.is_poisoned());

        assert_eq!(*lock_unpoisoned(&shared), vec![1, 2]);
    }
}
