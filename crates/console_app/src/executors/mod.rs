use std::sync::Arc;

use remote_console::{ConsoleConfig, Credential, ExecutorKind};
use remote_exec::{ExecutorInitError, RemoteExecutor};
use remote_exec_mock::ScriptedExecutor;
use remote_exec_ssh::{SshCredential, SshExecutor, SshTarget};

mod local;

pub use local::{LocalShellExecutor, LOCAL_EXECUTOR_ID};

/// Builds the executor selected by `config.executor`.
///
/// For `ssh` this connects and authenticates; any failure is fatal to startup.
pub fn executor_from_config(
    config: &ConsoleConfig,
) -> Result<Arc<dyn RemoteExecutor>, ExecutorInitError> {
    match config.executor {
        ExecutorKind::Ssh => {
            let target = ssh_target(config)?;
            tracing::info!(session = %target.label(), "connecting ssh session");
            Ok(Arc::new(SshExecutor::connect(&target)?))
        }
        ExecutorKind::Local => Ok(Arc::new(LocalShellExecutor::new(config.command_timeout))),
        ExecutorKind::Mock => Ok(Arc::new(ScriptedExecutor::new())),
    }
}

fn ssh_target(config: &ConsoleConfig) -> Result<SshTarget, ExecutorInitError> {
    let remote = &config.remote;
    let credential = match &remote.credential {
        Credential::Password(password) => SshCredential::Password(password.clone()),
        Credential::KeyFile { path, passphrase } => SshCredential::KeyFile {
            path: path.clone(),
            passphrase: passphrase.clone(),
        },
        Credential::None => {
            return Err(ExecutorInitError::new(
                "The ssh executor needs a password or a key file",
            ));
        }
    };

    Ok(SshTarget::new(remote.host.clone(), remote.user.clone(), credential)
        .with_port(remote.port)
        .with_connect_timeout(config.connect_timeout)
        .with_command_timeout(config.command_timeout))
}
