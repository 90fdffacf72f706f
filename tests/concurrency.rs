use std::sync::Arc;
use std::time::Duration;

use remote_console::{Console, ConsoleEvent, EventOutcome};
use remote_exec_mock::GatedExecutor;

mod support;

const WAIT: Duration = Duration::from_secs(2);

#[test]
fn rapid_executes_lose_no_start_messages() {
    let executor = Arc::new(GatedExecutor::new());
    let (sink, trace) = support::RecordingSink::new();
    let mut console = Console::start(executor.clone(), sink).expect("console starts");

    console.input().insert_str("sleep 1");
    let first = console.handle_event(ConsoleEvent::Execute).expect("first execute");
    console.input().insert_str("hostname");
    let second = console.handle_event(ConsoleEvent::Execute).expect("second execute");
    assert_ne!(first, second);

    assert!(executor.wait_for_entered(2, WAIT), "both runs reach the executor");
    assert!(support::wait_until(WAIT, || support::appended(&trace).len() == 2));
    let mut starts = support::appended(&trace);
    starts.sort();
    assert_eq!(starts, vec!["Start : hostname\n", "Start : sleep 1\n"]);
    assert_eq!(console.in_flight(), 2);

    executor.release();
    assert!(support::wait_until(WAIT, || support::appended(&trace).len() == 4));

    let lines = support::appended(&trace);
    for command in ["sleep 1", "hostname"] {
        let start = lines
            .iter()
            .position(|line| line == &format!("Start : {command}\n"))
            .expect("start line");
        let done = lines
            .iter()
            .position(|line| line == &format!("Done -- \nran {command}\n"))
            .expect("done line");
        assert!(start < done, "{command}: start must precede its result");
    }

    let report = console.shutdown(WAIT).expect("clean shutdown");
    assert_eq!(report.abandoned_dispatches, 0);
}

#[test]
fn execute_after_quit_is_ignored() {
    let executor = Arc::new(GatedExecutor::new());
    let (sink, _trace) = support::RecordingSink::new();
    let mut console = Console::start(executor.clone(), sink).expect("console starts");

    console.handle_event(ConsoleEvent::Quit).expect("quit");
    console.input().insert_str("reboot");
    let outcome = console.handle_event(ConsoleEvent::Execute).expect("execute");

    assert_eq!(outcome, EventOutcome::Ignored);
    assert_eq!(executor.entered(), 0);
    assert!(!console.input().is_empty(), "ignored execute must not consume input");
    console.shutdown(Duration::ZERO).expect("shutdown");
}
