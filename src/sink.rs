//! The long-lived loop that drains the result channel into the display.

use std::thread::{self, JoinHandle};

use crossbeam_channel::select;

use crate::channel::ResultReceiver;
use crate::error::{ConsoleError, SinkError};
use crate::lifecycle::LifecycleSignal;

/// Appendable scrollback text.
pub trait ResultSink: Send + 'static {
    /// Appends `text` verbatim. An error means the display is unusable.
    fn append(&mut self, text: &str) -> Result<(), SinkError>;
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn append(&mut self, text: &str) -> Result<(), SinkError> {
        (**self).append(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStop {
    /// The lifecycle signal fired.
    Cancelled,
    /// Every publisher went away.
    ChannelClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkReport {
    pub delivered: usize,
    pub stop: SinkStop,
}

/// Appends each message as its own line until cancelled.
///
/// Cancellation is checked before every wait; messages still queued at that
/// point are not delivered. The first append failure ends the loop with that error.
pub fn run_sink_loop(
    sink: &mut dyn ResultSink,
    results: &ResultReceiver,
    signal: &LifecycleSignal,
) -> Result<SinkReport, SinkError> {
    let mut delivered = 0usize;

    loop {
        if signal.is_cancelled() {
            return Ok(SinkReport {
                delivered,
                stop: SinkStop::Cancelled,
            });
        }

        select! {
            recv(results.inner()) -> message => match message {
                Ok(message) => {
                    sink.append(&format!("{message}\n"))?;
                    delivered += 1;
                }
                Err(_) => {
                    return Ok(SinkReport {
                        delivered,
                        stop: SinkStop::ChannelClosed,
                    });
                }
            },
            recv(signal.cancelled()) -> _ => {
                return Ok(SinkReport {
                    delivered,
                    stop: SinkStop::Cancelled,
                });
            }
        }
    }
}

/// Sink loop running on its own thread.
pub struct SinkLoop {
    handle: JoinHandle<Result<SinkReport, SinkError>>,
}

impl SinkLoop {
    pub fn spawn<S: ResultSink>(
        mut sink: S,
        results: ResultReceiver,
        signal: LifecycleSignal,
    ) -> Result<Self, ConsoleError> {
        let handle = thread::Builder::new()
            .name("remote-console-sink".to_string())
            .spawn(move || {
                let report = run_sink_loop(&mut sink, &results, &signal);
                match &report {
                    Ok(report) => tracing::info!(
                        delivered = report.delivered,
                        stop = ?report.stop,
                        "result sink loop finished"
                    ),
                    Err(error) => tracing::error!(%error, "result sink loop failed"),
                }
                report
            })
            .map_err(|error| ConsoleError::spawn("sink", error))?;

        Ok(Self { handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the loop and surfaces its failure, if any.
    pub fn join(self) -> Result<SinkReport, ConsoleError> {
        match self.handle.join() {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(error)) => Err(ConsoleError::Sink(error)),
            Err(_) => Err(ConsoleError::SinkPanicked),
        }
    }
}
