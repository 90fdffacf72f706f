use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use remote_exec::{ExecError, ExecutorProfile, RemoteExecutor};
use wait_timeout::ChildExt;

pub const LOCAL_EXECUTOR_ID: &str = "local";

/// Runs commands with `sh -c` on this host, under the same timeout policy as
/// the ssh executor. Handy without a server to talk to.
///
/// Each command leads its own process group, so a timeout kills everything
/// the shell started and no grandchild keeps the output pipes open.
pub struct LocalShellExecutor {
    command_timeout: Option<Duration>,
}

impl LocalShellExecutor {
    pub fn new(command_timeout: Option<Duration>) -> Self {
        Self { command_timeout }
    }
}

impl RemoteExecutor for LocalShellExecutor {
    fn profile(&self) -> ExecutorProfile {
        ExecutorProfile::new(LOCAL_EXECUTOR_ID, "localhost")
    }

    fn run(&self, command: &str) -> Result<String, ExecError> {
        if command.trim().is_empty() {
            return Err(ExecError::EmptyCommand);
        }

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(|error| ExecError::remote(format!("Failed to launch command: {error}")))?;

        let stdout = drain_pipe(child.stdout.take());
        let stderr = drain_pipe(child.stderr.take());

        let status = wait_for_exit(&mut child, self.command_timeout);

        // Join the readers even on failure so no thread outlives the child's pipes.
        let mut output = join_pipe(stdout);
        output.extend(join_pipe(stderr));
        let output = String::from_utf8_lossy(&output).into_owned();

        let status = status?;
        if status.success() {
            return Ok(output);
        }
        Err(exit_status_error(status, output))
    }
}

fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> Result<ExitStatus, ExecError> {
    let Some(timeout) = timeout else {
        return child
            .wait()
            .map_err(|error| ExecError::remote(format!("Failed waiting for command: {error}")));
    };

    match child.wait_timeout(timeout) {
        Ok(Some(status)) => Ok(status),
        Ok(None) => {
            kill_process_group(child);
            Err(ExecError::TimedOut { timeout })
        }
        Err(error) => {
            kill_process_group(child);
            Err(ExecError::remote(format!(
                "Failed waiting for command: {error}"
            )))
        }
    }
}

fn kill_process_group(child: &mut Child) {
    match i32::try_from(child.id()) {
        // SAFETY: kill(2) takes no pointers. The child was spawned with
        // process_group(0), so its pid is also its process group id.
        Ok(pgid) => unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        },
        Err(_) => {
            let _ = child.kill();
        }
    }
    let _ = child.wait();
}

fn exit_status_error(status: ExitStatus, output: String) -> ExecError {
    match status.code() {
        Some(code) => ExecError::ExitStatus { code, output },
        None => ExecError::remote("process terminated by signal"),
    }
}

// Pipes are drained concurrently so a chatty command cannot fill one and stall.
fn drain_pipe(pipe: Option<impl Read + Send + 'static>) -> Option<JoinHandle<Vec<u8>>> {
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        bytes
    }))
}

fn join_pipe(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default()
}
