//! Dispatch and result-delivery core of the remote command console.
//!
//! Invariant: the result channel is the only state shared between the
//! dispatch side and the display side.
//!
//! # Pipeline
//! - [`CommandInput::read_and_clear`] hands the typed command to a
//!   [`CommandDispatcher`], which runs it on its own thread against a
//!   [`remote_exec::RemoteExecutor`].
//! - Each dispatch publishes exactly two messages onto the result channel:
//!   `"Start : <cmd>"`, then `"Done -- \n<normalized output>"` or the error text.
//! - One [`SinkLoop`] thread appends every message as a line to a [`ResultSink`]
//!   until the [`LifecycleController`] fires.
//!
//! # Events
//! Operator actions are [`ConsoleEvent`] values handled by
//! [`Console::handle_event`], so the core runs without any terminal attached.

pub mod channel;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod input;
pub mod lifecycle;
pub mod logging;
pub mod normalize;
pub mod sink;
pub mod tasks;

pub use crate::channel::{result_channel, ResultReceiver, ResultSender};
pub use crate::config::{ConfigError, ConsoleConfig, Credential, ExecutorKind, RemoteConfig};
pub use crate::console::{Console, ConsoleEvent, EventOutcome, ShutdownReport};
pub use crate::dispatcher::{
    done_message, execute_command, start_message, CommandDispatcher, DispatchId, DispatchOutcome,
};
pub use crate::error::{ConsoleError, SinkError};
pub use crate::input::CommandInput;
pub use crate::lifecycle::{LifecycleController, LifecycleSignal, Phase};
pub use crate::normalize::{is_graphic, normalize_output};
pub use crate::sink::{run_sink_loop, ResultSink, SinkLoop, SinkReport, SinkStop};
pub use crate::tasks::DispatchTasks;
pub use remote_exec::lock_unpoisoned;
