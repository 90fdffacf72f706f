//! Operator actions as values, consumed by one dispatch function.

use std::sync::Arc;
use std::time::Duration;

use remote_exec::RemoteExecutor;

use crate::channel::result_channel;
use crate::dispatcher::{CommandDispatcher, DispatchId};
use crate::error::ConsoleError;
use crate::input::CommandInput;
use crate::lifecycle::{LifecycleController, Phase};
use crate::sink::{ResultSink, SinkLoop, SinkReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEvent {
    Execute,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Dispatched(DispatchId),
    QuitRequested,
    AlreadyStopping,
    /// `Execute` arrived after quit; nothing was read or run.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Messages the sink loop appended, when it stopped cleanly.
    pub delivered: Option<usize>,
    /// Dispatches still running when the grace period expired.
    pub abandoned_dispatches: usize,
}

/// The dispatch/delivery core: input, dispatcher, sink loop and lifecycle.
pub struct Console {
    input: Arc<CommandInput>,
    dispatcher: CommandDispatcher,
    lifecycle: LifecycleController,
    sink_loop: Option<SinkLoop>,
}

impl Console {
    /// Wires a fresh result channel between a dispatcher and a sink loop thread.
    pub fn start<S: ResultSink>(
        executor: Arc<dyn RemoteExecutor>,
        sink: S,
    ) -> Result<Self, ConsoleError> {
        let lifecycle = LifecycleController::new();
        let (results_tx, results_rx) = result_channel();
        let sink_loop = SinkLoop::spawn(sink, results_rx, lifecycle.signal())?;

        let profile = executor.profile();
        tracing::info!(
            executor = %profile.executor_id,
            session = %profile.target,
            "console started"
        );

        Ok(Self {
            input: Arc::new(CommandInput::new()),
            dispatcher: CommandDispatcher::new(executor, results_tx),
            lifecycle,
            sink_loop: Some(sink_loop),
        })
    }

    pub fn input(&self) -> &Arc<CommandInput> {
        &self.input
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    pub fn handle_event(&self, event: ConsoleEvent) -> Result<EventOutcome, ConsoleError> {
        match event {
            ConsoleEvent::Execute => {
                if self.lifecycle.is_cancelled() {
                    return Ok(EventOutcome::Ignored);
                }
                let dispatch_id = self.dispatcher.dispatch(&self.input)?;
                Ok(EventOutcome::Dispatched(dispatch_id))
            }
            ConsoleEvent::Quit => {
                if self.lifecycle.trigger() {
                    Ok(EventOutcome::QuitRequested)
                } else {
                    Ok(EventOutcome::AlreadyStopping)
                }
            }
        }
    }

    /// Surfaces a sink loop that ended on its own while the console is running.
    ///
    /// An append failure comes back as `Err` after cancelling the lifecycle.
    pub fn check_sink(&mut self) -> Result<(), ConsoleError> {
        let finished = self
            .sink_loop
            .as_ref()
            .is_some_and(|sink_loop| sink_loop.is_finished());
        if !finished {
            return Ok(());
        }

        let Some(sink_loop) = self.sink_loop.take() else {
            return Ok(());
        };
        let joined = sink_loop.join();
        self.lifecycle.trigger();
        joined.map(|_| ())
    }

    /// Cancels, stops the sink loop, waits up to `grace` for in-flight
    /// dispatches and closes the executor session. Safe to call repeatedly.
    pub fn shutdown(&mut self, grace: Duration) -> Result<ShutdownReport, ConsoleError> {
        self.lifecycle.trigger();

        let sink_result = self.sink_loop.take().map(SinkLoop::join).transpose();
        let abandoned_dispatches = self.dispatcher.wait_idle(grace);
        if abandoned_dispatches > 0 {
            tracing::warn!(abandoned_dispatches, "shutdown left dispatches running");
        }

        if self.lifecycle.phase() == Phase::Draining {
            if let Err(error) = self.dispatcher.executor().close() {
                tracing::warn!(%error, "failed to close executor session");
            }
            self.lifecycle.mark_stopped();
        }

        let report: Option<SinkReport> = sink_result?;
        Ok(ShutdownReport {
            delivered: report.map(|report| report.delivered),
            abandoned_dispatches,
        })
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        if self.lifecycle.phase() != Phase::Stopped {
            let _ = self.shutdown(Duration::ZERO);
        }
    }
}
