use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use remote_exec::RemoteExecutor;

use crate::channel::ResultSender;
use crate::error::ConsoleError;
use crate::input::CommandInput;
use crate::normalize::normalize_output;
use crate::tasks::DispatchTasks;

/// Identifier for one "execute" action.
pub type DispatchId = u64;

pub const START_PREFIX: &str = "Start : ";
pub const DONE_PREFIX: &str = "Done -- \n";

const EXECUTOR_PANIC_MESSAGE: &str = "remote executor panicked";

pub fn start_message(command: &str) -> String {
    format!("{START_PREFIX}{command}")
}

pub fn done_message(normalized_output: &str) -> String {
    format!("{DONE_PREFIX}{normalized_output}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Succeeded,
    Failed,
}

/// Runs one command to completion on the calling thread.
///
/// Publishes exactly two messages: the start notice, then either the
/// normalized output or the error description.
pub fn execute_command(
    executor: &dyn RemoteExecutor,
    results: &ResultSender,
    command: &str,
) -> DispatchOutcome {
    results.publish(start_message(command));

    let outcome = catch_unwind(AssertUnwindSafe(|| executor.run(command)));
    match outcome {
        Ok(Ok(raw)) => {
            results.publish(done_message(&normalize_output(&raw)));
            DispatchOutcome::Succeeded
        }
        Ok(Err(error)) => {
            tracing::debug!(%error, "remote command failed");
            results.publish(error.to_string());
            DispatchOutcome::Failed
        }
        Err(_) => {
            tracing::error!("remote executor panicked");
            results.publish(EXECUTOR_PANIC_MESSAGE);
            DispatchOutcome::Failed
        }
    }
}

/// Turns "execute" actions into background command runs.
pub struct CommandDispatcher {
    executor: Arc<dyn RemoteExecutor>,
    results: ResultSender,
    tasks: DispatchTasks,
    next_dispatch_id: AtomicU64,
}

impl CommandDispatcher {
    pub fn new(executor: Arc<dyn RemoteExecutor>, results: ResultSender) -> Self {
        Self {
            executor,
            results,
            tasks: DispatchTasks::new(),
            next_dispatch_id: AtomicU64::new(1),
        }
    }

    /// Reads and clears `input`, then runs the command on its own thread.
    ///
    /// Empty input is dispatched as-is; the executor reports the error.
    pub fn dispatch(&self, input: &CommandInput) -> Result<DispatchId, ConsoleError> {
        let command = input.read_and_clear();
        self.dispatch_command(command)
    }

    pub fn dispatch_command(&self, command: String) -> Result<DispatchId, ConsoleError> {
        let dispatch_id = self.next_dispatch_id.fetch_add(1, Ordering::SeqCst);
        let executor = Arc::clone(&self.executor);
        let results = self.results.clone();

        let handle = thread::Builder::new()
            .name(format!("remote-console-dispatch-{dispatch_id}"))
            .spawn(move || {
                tracing::info!(dispatch_id, "dispatch started");
                let outcome = execute_command(executor.as_ref(), &results, &command);
                tracing::info!(dispatch_id, ?outcome, "dispatch finished");
            })
            .map_err(|error| ConsoleError::spawn("dispatch", error))?;

        self.tasks.track(dispatch_id, handle);
        Ok(dispatch_id)
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.in_flight()
    }

    /// See [`DispatchTasks::wait_idle`].
    pub fn wait_idle(&self, grace: Duration) -> usize {
        self.tasks.wait_idle(grace)
    }

    pub fn executor(&self) -> &Arc<dyn RemoteExecutor> {
        &self.executor
    }
}
