//! Process-wide one-shot cancellation and the application phase machine.
//!
//! `Running -> Draining -> Stopped`, never back. The signal is a zero-capacity
//! channel whose only sender is dropped on trigger, so every clone of the
//! receiver observes the disconnect at once and can `select!` on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use remote_exec::lock_unpoisoned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Draining,
    Stopped,
}

#[derive(Debug)]
struct Shared {
    phase: Mutex<Phase>,
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

/// Owner-side handle: triggers cancellation and records teardown.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    shared: Arc<Shared>,
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleController {
    pub fn new() -> Self {
        let (trigger, done) = crossbeam_channel::bounded(0);
        Self {
            shared: Arc::new(Shared {
                phase: Mutex::new(Phase::Running),
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
            }),
        }
    }

    /// Triggers cancellation. Returns `true` only for the call that actually fired it.
    pub fn trigger(&self) -> bool {
        let Some(trigger) = lock_unpoisoned(&self.shared.trigger).take() else {
            return false;
        };

        self.shared.cancelled.store(true, Ordering::SeqCst);
        {
            let mut phase = lock_unpoisoned(&self.shared.phase);
            if *phase == Phase::Running {
                *phase = Phase::Draining;
            }
        }
        drop(trigger);

        tracing::info!("lifecycle cancelled; draining");
        true
    }

    /// Records that every resource has been released. Only valid from `Draining`.
    pub fn mark_stopped(&self) -> bool {
        let mut phase = lock_unpoisoned(&self.shared.phase);
        if *phase != Phase::Draining {
            return false;
        }

        *phase = Phase::Stopped;
        tracing::info!("lifecycle stopped");
        true
    }

    pub fn phase(&self) -> Phase {
        *lock_unpoisoned(&self.shared.phase)
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Returns a reader handle for loops that must stop on cancellation.
    pub fn signal(&self) -> LifecycleSignal {
        LifecycleSignal {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Reader-side handle of the cancellation flag.
#[derive(Debug, Clone)]
pub struct LifecycleSignal {
    shared: Arc<Shared>,
}

impl LifecycleSignal {
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Receiver that becomes ready (disconnected) once cancellation fires.
    pub fn cancelled(&self) -> &Receiver<()> {
        &self.shared.done
    }

    /// Waits up to `timeout` for cancellation. Returns whether it fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.shared.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => self.is_cancelled(),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Instant;

    use super::*;

    #[test]
    fn trigger_is_idempotent() {
        let lifecycle = LifecycleController::new();
        assert_eq!(lifecycle.phase(), Phase::Running);

        assert!(lifecycle.trigger());
        assert!(!lifecycle.trigger());
        assert!(lifecycle.is_cancelled());
        assert_eq!(lifecycle.phase(), Phase::Draining);
    }

    #[test]
    fn phases_only_move_forward() {
        let lifecycle = LifecycleController::new();
        assert!(!lifecycle.mark_stopped(), "cannot stop before draining");

        lifecycle.trigger();
        assert!(lifecycle.mark_stopped());
        assert_eq!(lifecycle.phase(), Phase::Stopped);

        assert!(!lifecycle.trigger());
        assert!(!lifecycle.mark_stopped());
        assert_eq!(lifecycle.phase(), Phase::Stopped);
    }

    #[test]
    fn every_signal_clone_observes_cancellation() {
        let lifecycle = LifecycleController::new();
        let readers: Vec<_> = (0..3)
            .map(|_| {
                let signal = lifecycle.signal();
                thread::spawn(move || signal.wait_timeout(Duration::from_secs(5)))
            })
            .collect();

        lifecycle.trigger();
        for reader in readers {
            assert!(reader.join().expect("reader joins"));
        }
    }

    #[test]
    fn wait_timeout_returns_false_while_running() {
        let lifecycle = LifecycleController::new();
        let started = Instant::now();
        assert!(!lifecycle.signal().wait_timeout(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
