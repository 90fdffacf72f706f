use std::sync::Arc;
use std::time::Duration;

use remote_console::{Console, ConsoleError, ConsoleEvent, EventOutcome, Phase, SinkError};
use remote_exec_mock::{GatedExecutor, ScriptedExecutor};

mod support;

const WAIT: Duration = Duration::from_secs(2);

#[test]
fn quit_twice_behaves_like_quit_once() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (sink, _trace) = support::RecordingSink::new();
    let mut console = Console::start(executor.clone(), sink).expect("console starts");

    assert_eq!(
        console.handle_event(ConsoleEvent::Quit).expect("quit"),
        EventOutcome::QuitRequested
    );
    assert_eq!(
        console.handle_event(ConsoleEvent::Quit).expect("quit again"),
        EventOutcome::AlreadyStopping
    );
    assert_eq!(console.lifecycle().phase(), Phase::Draining);

    console.shutdown(WAIT).expect("first shutdown");
    console.shutdown(WAIT).expect("second shutdown is a no-op");

    assert_eq!(console.lifecycle().phase(), Phase::Stopped);
    assert_eq!(executor.close_calls(), 1, "session released exactly once");
}

#[test]
fn shutdown_grace_waits_for_in_flight_dispatch() {
    let executor = Arc::new(ScriptedExecutor::new().with_delay(Duration::from_millis(100)));
    let (sink, _trace) = support::RecordingSink::new();
    let mut console = Console::start(executor.clone(), sink).expect("console starts");

    console.input().insert_str("sync");
    console.handle_event(ConsoleEvent::Execute).expect("execute");
    console.handle_event(ConsoleEvent::Quit).expect("quit");

    let report = console.shutdown(WAIT).expect("shutdown");
    assert_eq!(report.abandoned_dispatches, 0);
    assert_eq!(executor.commands(), vec!["sync"]);
}

#[test]
fn zero_grace_leaves_blocked_dispatch_running() {
    let executor = Arc::new(GatedExecutor::new());
    let (sink, _trace) = support::RecordingSink::new();
    let mut console = Console::start(executor.clone(), sink).expect("console starts");

    console.input().insert_str("tail -f /var/log/syslog");
    console.handle_event(ConsoleEvent::Execute).expect("execute");
    assert!(executor.wait_for_entered(1, WAIT));

    let report = console.shutdown(Duration::ZERO).expect("shutdown");
    assert_eq!(report.abandoned_dispatches, 1);
    assert_eq!(console.lifecycle().phase(), Phase::Stopped);

    // The in-flight run completes on its own; its late result is simply dropped.
    executor.release();
}

#[test]
fn display_failure_is_fatal_and_surfaced() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (sink, trace) = support::RecordingSink::new();
    let mut console = Console::start(executor, sink).expect("console starts");

    support::close(&trace);
    console.input().insert_str("ls");
    console.handle_event(ConsoleEvent::Execute).expect("execute");

    let mut surfaced = None;
    assert!(support::wait_until(WAIT, || match console.check_sink() {
        Ok(()) => false,
        Err(error) => {
            surfaced = Some(error);
            true
        }
    }));
    assert!(matches!(
        surfaced,
        Some(ConsoleError::Sink(SinkError::Closed))
    ));
    assert!(console.lifecycle().is_cancelled());

    let report = console.shutdown(WAIT).expect("shutdown after sink failure");
    assert_eq!(report.delivered, None);
}

#[test]
fn dropping_a_running_console_releases_the_session() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (sink, _trace) = support::RecordingSink::new();
    let console = Console::start(executor.clone(), sink).expect("console starts");

    drop(console);
    assert_eq!(executor.close_calls(), 1);
}
