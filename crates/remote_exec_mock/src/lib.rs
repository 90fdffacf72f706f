//! Deterministic in-process implementations of the `remote_exec` contract.
//!
//! Nothing here touches the network. [`ScriptedExecutor`] replays queued
//! outcomes (and echoes when the script runs dry); [`GatedExecutor`] holds every
//! run until the test releases it, for exercising concurrent dispatch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use remote_exec::{lock_unpoisoned, ExecError, ExecutorProfile, RemoteExecutor};

/// Stable executor identifier used for explicit startup selection.
pub const MOCK_EXECUTOR_ID: &str = "mock";

/// Executor that returns queued outcomes in order, then echoes commands back.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Result<String, ExecError>>>,
    commands: Mutex<Vec<String>>,
    delay: Option<Duration>,
    close_calls: AtomicUsize,
}

impl ScriptedExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor that replays `outcomes` in order.
    #[must_use]
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = Result<String, ExecError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Sleeps for `delay` inside every run before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Commands received so far, in call order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        lock_unpoisoned(&self.commands).clone()
    }

    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl RemoteExecutor for ScriptedExecutor {
    fn profile(&self) -> ExecutorProfile {
        ExecutorProfile::new(MOCK_EXECUTOR_ID, "mock@localhost")
    }

    fn run(&self, command: &str) -> Result<String, ExecError> {
        lock_unpoisoned(&self.commands).push(command.to_string());

        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        let scripted = lock_unpoisoned(&self.script).pop_front();
        match scripted {
            Some(outcome) => outcome,
            None if command.trim().is_empty() => Err(ExecError::EmptyCommand),
            None => Ok(format!("{command}\n")),
        }
    }

    fn close(&self) -> Result<(), ExecError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    entered: usize,
}

/// Executor whose runs block until [`GatedExecutor::release`] is called.
#[derive(Debug, Default)]
pub struct GatedExecutor {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl GatedExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate for all current and future runs.
    pub fn release(&self) {
        lock_unpoisoned(&self.state).open = true;
        self.changed.notify_all();
    }

    /// Number of runs that have entered the executor.
    #[must_use]
    pub fn entered(&self) -> usize {
        lock_unpoisoned(&self.state).entered
    }

    /// Blocks until at least `count` runs have entered, or `timeout` elapses.
    pub fn wait_for_entered(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = lock_unpoisoned(&self.state);
        while state.entered < count {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            state = match self.changed.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

impl RemoteExecutor for GatedExecutor {
    fn profile(&self) -> ExecutorProfile {
        ExecutorProfile::new(MOCK_EXECUTOR_ID, "gated@localhost")
    }

    fn run(&self, command: &str) -> Result<String, ExecError> {
        let mut state = lock_unpoisoned(&self.state);
        state.entered += 1;
        self.changed.notify_all();

        while !state.open {
            state = match self.changed.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }

        Ok(format!("ran {command}"))
    }
}
