//! Ordered hand-off queue between command dispatch and the display.
//!
//! Invariant: messages reach the receiver in exactly the order they were
//! published, across any number of cloned senders. The queue is unbounded, so
//! `publish` never blocks and never drops while the receiver is alive.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Creates a connected sender/receiver pair.
pub fn result_channel() -> (ResultSender, ResultReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ResultSender { tx }, ResultReceiver { rx })
}

/// Publishing side. Cheap to clone; one clone per dispatch.
#[derive(Debug, Clone)]
pub struct ResultSender {
    tx: Sender<String>,
}

impl ResultSender {
    /// Publishes one result message.
    ///
    /// Returns `false` when the receiver has gone away (the sink loop stopped),
    /// in which case the message is discarded.
    pub fn publish(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        match self.tx.send(message) {
            Ok(()) => true,
            Err(undelivered) => {
                tracing::debug!(
                    bytes = undelivered.0.len(),
                    "result message dropped after sink shutdown"
                );
                false
            }
        }
    }
}

/// Consuming side. Exactly one exists per channel.
#[derive(Debug)]
pub struct ResultReceiver {
    rx: Receiver<String>,
}

impl ResultReceiver {
    pub(crate) fn inner(&self) -> &Receiver<String> {
        &self.rx
    }

    /// Returns the next queued message without waiting.
    pub fn try_recv(&self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Number of messages queued and not yet consumed.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn single_publisher_order_is_preserved() {
        let (tx, rx) = result_channel();
        for n in 0..100 {
            assert!(tx.publish(format!("message {n}")));
        }

        let received: Vec<String> = std::iter::from_fn(|| rx.try_recv()).collect();
        let expected: Vec<String> = (0..100).map(|n| format!("message {n}")).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn concurrent_publishers_keep_their_own_relative_order() {
        let (tx, rx) = result_channel();
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for n in 0..250 {
                        tx.publish(format!("{worker}:{n}"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("publisher joins");
        }

        let received: Vec<String> = std::iter::from_fn(|| rx.try_recv()).collect();
        assert_eq!(received.len(), 1000);
        for worker in 0..4 {
            let sequence: Vec<usize> = received
                .iter()
                .filter_map(|message| message.strip_prefix(&format!("{worker}:")))
                .map(|n| n.parse().expect("numeric suffix"))
                .collect();
            assert_eq!(sequence, (0..250).collect::<Vec<_>>());
        }
    }

    #[test]
    fn publish_after_receiver_drop_reports_loss() {
        let (tx, rx) = result_channel();
        drop(rx);
        assert!(!tx.publish("late"));
    }
}
