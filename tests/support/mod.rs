#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use remote_console::{lock_unpoisoned, ResultSink, SinkError};

#[derive(Default)]
pub struct SinkTrace {
    pub appended: Vec<String>,
    pub closed: bool,
}

/// Display stand-in that records every append and can be torn down.
#[derive(Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<SinkTrace>>,
}

impl RecordingSink {
    pub fn new() -> (Self, Arc<Mutex<SinkTrace>>) {
        let sink = Self::default();
        let state = Arc::clone(&sink.state);
        (sink, state)
    }
}

impl ResultSink for RecordingSink {
    fn append(&mut self, text: &str) -> Result<(), SinkError> {
        let mut state = lock_unpoisoned(&self.state);
        if state.closed {
            return Err(SinkError::Closed);
        }
        state.appended.push(text.to_string());
        Ok(())
    }
}

pub fn appended(state: &Arc<Mutex<SinkTrace>>) -> Vec<String> {
    lock_unpoisoned(state).appended.clone()
}

pub fn close(state: &Arc<Mutex<SinkTrace>>) {
    lock_unpoisoned(state).closed = true;
}

pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    predicate()
}
