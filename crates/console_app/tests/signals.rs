use std::time::Duration;

use console_app::platform::install_quit_signals;
use remote_console::{LifecycleController, Phase};

#[test]
fn sighup_triggers_the_quit_lifecycle() {
    let lifecycle = LifecycleController::new();
    let guard = install_quit_signals(lifecycle.clone()).expect("signal handlers");

    // SAFETY: the handler installed above replaces the default action for SIGHUP.
    let raised = unsafe { libc::raise(libc::SIGHUP) };
    assert_eq!(raised, 0);

    assert!(lifecycle.signal().wait_timeout(Duration::from_secs(2)));
    assert_eq!(lifecycle.phase(), Phase::Draining);
    drop(guard);
}
