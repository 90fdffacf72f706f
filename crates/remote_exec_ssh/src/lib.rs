//! SSH-backed `remote_exec::RemoteExecutor`.
//!
//! One authenticated `ssh2` session per executor. Each `run` opens a fresh
//! exec channel on that session; runs are serialized because a blocking
//! `ssh2::Session` cannot drive several channels at once.
//!
//! The command timeout is a deadline for the whole run: output is read in
//! short polls and the run fails with `TimedOut` once the deadline passes,
//! even if the remote side keeps writing.

mod slot;

use std::fmt;
use std::io::{self, Read};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use remote_exec::{ExecError, ExecutorInitError, ExecutorProfile, RemoteExecutor};
use ssh2::{ErrorCode, ExtendedData, Session};

use crate::slot::{SessionSlot, Taken};

/// Stable executor identifier used for explicit startup selection.
pub const SSH_EXECUTOR_ID: &str = "ssh";

pub const DEFAULT_SSH_PORT: u16 = 22;

// libssh2's LIBSSH2_ERROR_TIMEOUT.
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

// Longest a single channel read blocks while a command deadline is armed.
const READ_POLL_MILLIS: u32 = 200;
const READ_CHUNK: usize = 8 * 1024;

/// How the session authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum SshCredential {
    Password(String),
    KeyFile {
        path: PathBuf,
        passphrase: Option<String>,
    },
}

impl fmt::Debug for SshCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::KeyFile { path, passphrase } => f
                .debug_struct("KeyFile")
                .field("path", path)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Connection parameters for one SSH session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub credential: SshCredential,
    pub connect_timeout: Duration,
    /// Deadline for one remote command. `None` blocks until it finishes.
    pub command_timeout: Option<Duration>,
}

impl SshTarget {
    pub fn new(host: impl Into<String>, user: impl Into<String>, credential: SshCredential) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            user: user.into(),
            credential,
            connect_timeout: Duration::from_secs(10),
            command_timeout: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// `user@host:port`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

pub struct SshExecutor {
    label: String,
    command_timeout: Option<Duration>,
    slot: SessionSlot<Connection>,
}

/// The session plus a second handle on its socket, so `close` can cut the
/// transport under a run that is blocked inside libssh2.
#[derive(Clone)]
struct Connection {
    session: Session,
    socket: Arc<TcpStream>,
}

impl SshExecutor {
    /// Connects, handshakes and authenticates. Any failure is fatal to startup.
    pub fn connect(target: &SshTarget) -> Result<Self, ExecutorInitError> {
        let label = target.label();
        let address = (target.host.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|error| ExecutorInitError::new(format!("Failed to resolve {label}: {error}")))?
            .next()
            .ok_or_else(|| ExecutorInitError::new(format!("No address found for {label}")))?;

        let stream = TcpStream::connect_timeout(&address, target.connect_timeout)
            .map_err(|error| ExecutorInitError::new(format!("Failed to connect to {label}: {error}")))?;

        let socket = stream
            .try_clone()
            .map_err(|error| ExecutorInitError::new(format!("Failed to share the socket: {error}")))?;

        let mut session = Session::new()
            .map_err(|error| ExecutorInitError::new(format!("Failed to create SSH session: {error}")))?;
        session.set_tcp_stream(stream);
        session.set_timeout(duration_to_millis(Some(target.connect_timeout)));
        session
            .handshake()
            .map_err(|error| ExecutorInitError::new(format!("SSH handshake with {label} failed: {error}")))?;

        let auth = match &target.credential {
            SshCredential::Password(password) => session.userauth_password(&target.user, password),
            SshCredential::KeyFile { path, passphrase } => {
                session.userauth_pubkey_file(&target.user, None, path, passphrase.as_deref())
            }
        };
        auth.map_err(|error| {
            ExecutorInitError::new(format!("SSH authentication for {label} failed: {error}"))
        })?;
        if !session.authenticated() {
            return Err(ExecutorInitError::new(format!(
                "SSH authentication for {label} was rejected"
            )));
        }

        session.set_timeout(duration_to_millis(target.command_timeout));
        tracing::info!(session = %label, "ssh session established");

        Ok(Self {
            label,
            command_timeout: target.command_timeout,
            slot: SessionSlot::new(Connection {
                session,
                socket: Arc::new(socket),
            }),
        })
    }

    fn run_on_session(&self, session: &Session, command: &str) -> Result<String, ExecError> {
        let mut channel = session.channel_session().map_err(|e| self.map_ssh_error(e))?;
        channel
            .handle_extended_data(ExtendedData::Merge)
            .map_err(|e| self.map_ssh_error(e))?;
        channel.exec(command).map_err(|e| self.map_ssh_error(e))?;

        let deadline = self.command_timeout.map(|timeout| Instant::now() + timeout);
        if deadline.is_some() {
            session.set_timeout(READ_POLL_MILLIS);
        }
        let read = read_until_deadline(&mut channel, deadline);
        session.set_timeout(duration_to_millis(self.command_timeout));
        let raw = read.map_err(|e| self.map_io_error(e))?;

        channel.wait_close().map_err(|e| self.map_ssh_error(e))?;
        let code = channel.exit_status().map_err(|e| self.map_ssh_error(e))?;

        let output = String::from_utf8_lossy(&raw).into_owned();
        if code != 0 {
            return Err(ExecError::ExitStatus { code, output });
        }

        Ok(output)
    }

    fn map_ssh_error(&self, error: ssh2::Error) -> ExecError {
        if error.code() == ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) {
            if let Some(timeout) = self.command_timeout {
                return ExecError::TimedOut { timeout };
            }
        }
        ExecError::remote(error.to_string())
    }

    fn map_io_error(&self, error: io::Error) -> ExecError {
        match (error.kind(), self.command_timeout) {
            (io::ErrorKind::TimedOut, Some(timeout)) => ExecError::TimedOut { timeout },
            _ => ExecError::remote(error.to_string()),
        }
    }
}

impl RemoteExecutor for SshExecutor {
    fn profile(&self) -> ExecutorProfile {
        ExecutorProfile::new(SSH_EXECUTOR_ID, self.label.clone())
    }

    fn run(&self, command: &str) -> Result<String, ExecError> {
        if command.trim().is_empty() {
            return Err(ExecError::EmptyCommand);
        }

        let result = self.slot.with_session(|connection| {
            tracing::debug!(session = %self.label, "running remote command");
            self.run_on_session(&connection.session, command)
        });

        match result {
            Err(ExecError::Remote(_)) if self.slot.is_closed() => Err(ExecError::SessionClosed),
            other => other,
        }
    }

    /// Never waits for an in-flight command: a busy session has its socket
    /// shut down, which fails the blocked read, instead of a graceful disconnect.
    fn close(&self) -> Result<(), ExecError> {
        let Some(Taken { session: connection, busy }) = self.slot.take() else {
            return Ok(());
        };

        if busy {
            tracing::info!(session = %self.label, "closing ssh session under a running command");
            return connection
                .socket
                .shutdown(Shutdown::Both)
                .map_err(|error| ExecError::remote(error.to_string()));
        }

        tracing::info!(session = %self.label, "closing ssh session");
        connection
            .session
            .disconnect(None, "remote console closed", None)
            .map_err(|error| ExecError::remote(error.to_string()))
    }
}

impl Drop for SshExecutor {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn duration_to_millis(duration: Option<Duration>) -> u32 {
    duration
        .map(|duration| u32::try_from(duration.as_millis()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Reads to EOF, giving up with `TimedOut` once `deadline` passes.
///
/// With a deadline armed, `TimedOut` and `WouldBlock` from the reader are
/// treated as empty polls.
fn read_until_deadline<R: Read>(reader: &mut R, deadline: Option<Instant>) -> io::Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(output),
            Ok(read) => output.extend_from_slice(&chunk[..read]),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error)
                if deadline.is_some()
                    && matches!(
                        error.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    ) => {}
            Err(error) => return Err(error),
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "remote command passed its deadline",
            ));
        }
    }
}
