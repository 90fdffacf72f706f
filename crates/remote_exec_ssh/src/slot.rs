//! Session ownership shared by running commands and `close`.

use std::sync::{Mutex, TryLockError};

use remote_exec::{lock_unpoisoned, ExecError};

/// Holds the live session handle.
///
/// Runs are serialized on `runs`, but the handle itself sits behind its own
/// short-lived lock, so `take` never waits for a command to finish.
pub(crate) struct SessionSlot<S> {
    current: Mutex<Option<S>>,
    runs: Mutex<()>,
}

/// A session removed from its slot.
pub(crate) struct Taken<S> {
    pub session: S,
    /// A run was still using the session when it was taken.
    pub busy: bool,
}

impl<S: Clone> SessionSlot<S> {
    pub fn new(session: S) -> Self {
        Self {
            current: Mutex::new(Some(session)),
            runs: Mutex::new(()),
        }
    }

    /// Runs `run` against a handle to the session, one caller at a time.
    pub fn with_session<T>(
        &self,
        run: impl FnOnce(&S) -> Result<T, ExecError>,
    ) -> Result<T, ExecError> {
        let _turn = lock_unpoisoned(&self.runs);
        let session = lock_unpoisoned(&self.current)
            .clone()
            .ok_or(ExecError::SessionClosed)?;
        run(&session)
    }

    /// Empties the slot. `None` once already taken.
    pub fn take(&self) -> Option<Taken<S>> {
        let session = lock_unpoisoned(&self.current).take()?;
        let busy = matches!(self.runs.try_lock(), Err(TryLockError::WouldBlock));
        Some(Taken { session, busy })
    }

    pub fn is_closed(&self) -> bool {
        lock_unpoisoned(&self.current).is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::{Arc, Condvar};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;

    /// Stand-in session whose command blocks until the gate opens.
    #[derive(Clone, Default)]
    struct GatedSession {
        gate: Arc<(Mutex<bool>, Condvar)>,
    }

    impl GatedSession {
        fn run_until_open(&self) {
            let (open, changed) = &*self.gate;
            let mut open = lock_unpoisoned(open);
            while !*open {
                open = changed.wait(open).expect("gate wait");
            }
        }

        fn open(&self) {
            let (open, changed) = &*self.gate;
            *lock_unpoisoned(open) = true;
            changed.notify_all();
        }
    }

    #[test]
    fn take_from_another_thread_does_not_wait_for_an_in_flight_run() {
        let session = GatedSession::default();
        let slot = Arc::new(SessionSlot::new(session.clone()));

        let (started_tx, started_rx) = mpsc::channel();
        let runner = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                slot.with_session(|session| {
                    let _ = started_tx.send(());
                    session.run_until_open();
                    Ok("done")
                })
            })
        };
        started_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("run should start");

        let (closed_tx, closed_rx) = mpsc::channel();
        let closer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                let started = Instant::now();
                let busy = slot.take().map(|taken| taken.busy);
                let _ = closed_tx.send((busy, started.elapsed()));
            })
        };
        let (busy, elapsed) = closed_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("take should return while the run is blocked");
        assert_eq!(busy, Some(true));
        assert!(elapsed < Duration::from_secs(1), "take waited {elapsed:?}");
        assert!(slot.is_closed());

        session.open();
        assert_eq!(runner.join().expect("runner thread").expect("run result"), "done");
        closer.join().expect("closer thread");
    }

    #[test]
    fn runs_after_take_see_a_closed_session() {
        let slot = SessionSlot::new(GatedSession::default());

        let taken = slot.take().expect("first take");
        assert!(!taken.busy);
        assert!(slot.take().is_none());

        let result = slot.with_session(|_| Ok(()));
        assert!(matches!(result, Err(ExecError::SessionClosed)));
    }
}
