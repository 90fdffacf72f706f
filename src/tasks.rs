use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use remote_exec::lock_unpoisoned;

use crate::dispatcher::DispatchId;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

struct TrackedDispatch {
    id: DispatchId,
    handle: JoinHandle<()>,
}

/// Join handles of dispatch threads that may still be running.
#[derive(Default)]
pub struct DispatchTasks {
    tracked: Mutex<Vec<TrackedDispatch>>,
}

impl DispatchTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track(&self, id: DispatchId, handle: JoinHandle<()>) {
        let mut tracked = self.lock();
        reap_finished(&mut tracked);
        tracked.push(TrackedDispatch { id, handle });
    }

    /// Number of dispatches whose thread has not finished yet.
    pub fn in_flight(&self) -> usize {
        let mut tracked = self.lock();
        reap_finished(&mut tracked);
        tracked.len()
    }

    /// Waits up to `grace` for every tracked dispatch to finish.
    ///
    /// Returns how many were still running when the grace period ran out.
    /// Those threads are detached, never interrupted.
    pub fn wait_idle(&self, grace: Duration) -> usize {
        let deadline = Instant::now() + grace;
        loop {
            let remaining = self.in_flight();
            if remaining == 0 || Instant::now() >= deadline {
                return remaining;
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TrackedDispatch>> {
        lock_unpoisoned(&self.tracked)
    }
}

fn reap_finished(tracked: &mut Vec<TrackedDispatch>) {
    let mut index = 0;
    while index < tracked.len() {
        if tracked[index].handle.is_finished() {
            let finished = tracked.swap_remove(index);
            if finished.handle.join().is_err() {
                tracing::warn!(dispatch_id = finished.id, "dispatch thread panicked");
            }
        } else {
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn finished_dispatches_are_reaped() {
        let tasks = DispatchTasks::new();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        tasks.track(1, thread::spawn(|| {}));
        tasks.track(
            2,
            thread::spawn(move || {
                let _ = release_rx.recv();
            }),
        );

        assert_eq!(tasks.wait_idle(Duration::from_millis(50)), 1);

        release_tx.send(()).expect("release");
        assert_eq!(tasks.wait_idle(Duration::from_secs(2)), 0);
        assert_eq!(tasks.in_flight(), 0);
    }

    #[test]
    fn zero_grace_reports_without_waiting() {
        let tasks = DispatchTasks::new();
        let (_hold_tx, hold_rx) = mpsc::channel::<()>();
        tasks.track(
            1,
            thread::spawn(move || {
                let _ = hold_rx.recv_timeout(Duration::from_secs(5));
            }),
        );

        let started = Instant::now();
        assert_eq!(tasks.wait_idle(Duration::ZERO), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
