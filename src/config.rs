//! Startup configuration: optional JSON file, overridden by environment variables.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_ENV_VAR: &str = "REMOTE_CONSOLE_CONFIG_PATH";
pub const EXECUTOR_ENV_VAR: &str = "REMOTE_CONSOLE_EXECUTOR";
pub const HOST_ENV_VAR: &str = "REMOTE_CONSOLE_HOST";
pub const USER_ENV_VAR: &str = "REMOTE_CONSOLE_USER";
pub const PASSWORD_ENV_VAR: &str = "REMOTE_CONSOLE_PASSWORD";
pub const KEY_PATH_ENV_VAR: &str = "REMOTE_CONSOLE_KEY_PATH";
pub const KEY_PASSPHRASE_ENV_VAR: &str = "REMOTE_CONSOLE_KEY_PASSPHRASE";
pub const PORT_ENV_VAR: &str = "REMOTE_CONSOLE_PORT";
pub const COMMAND_TIMEOUT_ENV_VAR: &str = "REMOTE_CONSOLE_COMMAND_TIMEOUT_SEC";
pub const CONNECT_TIMEOUT_ENV_VAR: &str = "REMOTE_CONSOLE_CONNECT_TIMEOUT_SEC";
pub const REDRAW_INTERVAL_ENV_VAR: &str = "REMOTE_CONSOLE_REDRAW_INTERVAL_MS";
pub const SHUTDOWN_GRACE_ENV_VAR: &str = "REMOTE_CONSOLE_SHUTDOWN_GRACE_MS";
pub const LOG_PATH_ENV_VAR: &str = "REMOTE_CONSOLE_LOG_PATH";

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_COMMAND_TIMEOUT_SEC: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SEC: u64 = 10;
pub const DEFAULT_REDRAW_INTERVAL_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{field}` is required for the {executor} executor")]
    Missing {
        field: &'static str,
        executor: &'static str,
    },

    #[error("invalid `{field}` value '{value}': {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("unsupported executor '{0}'; expected one of: ssh, local, mock")]
    UnknownExecutor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    Ssh,
    Local,
    Mock,
}

impl ExecutorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Local => "local",
            Self::Mock => "mock",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ssh" => Ok(Self::Ssh),
            "local" => Ok(Self::Local),
            "mock" => Ok(Self::Mock),
            _ => Err(ConfigError::UnknownExecutor(value.to_string())),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    None,
    Password(String),
    KeyFile {
        path: PathBuf,
        passphrase: Option<String>,
    },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::KeyFile { path, .. } => f.debug_struct("KeyFile").field("path", path).finish(),
        }
    }
}

/// Where the remote session goes and how it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub credential: Credential,
}

/// Everything the console reads at startup. Built once, passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub executor: ExecutorKind,
    pub remote: RemoteConfig,
    /// `None` waits for the executor forever.
    pub command_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub redraw_interval: Duration,
    /// How long shutdown waits for in-flight dispatches.
    pub shutdown_grace: Duration,
    pub log_path: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            executor: ExecutorKind::Ssh,
            remote: RemoteConfig {
                host: String::new(),
                user: String::new(),
                port: DEFAULT_PORT,
                credential: Credential::None,
            },
            command_timeout: Some(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SEC)),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SEC),
            redraw_interval: Duration::from_millis(DEFAULT_REDRAW_INTERVAL_MS),
            shutdown_grace: Duration::ZERO,
            log_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    executor: Option<String>,
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
    key_path: Option<PathBuf>,
    key_passphrase: Option<String>,
    port: Option<u16>,
    command_timeout_sec: Option<u64>,
    connect_timeout_sec: Option<u64>,
    redraw_interval_ms: Option<u64>,
    shutdown_grace_ms: Option<u64>,
    log_path: Option<PathBuf>,
}

impl ConsoleConfig {
    /// Loads from the process environment (and the file it points at).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads using `lookup` in place of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let file = match lookup(CONFIG_PATH_ENV_VAR) {
            Some(path) => read_file_config(Path::new(path.trim()))?,
            None => FileConfig::default(),
        };

        let mut config = Self::default();

        if let Some(executor) = lookup(EXECUTOR_ENV_VAR).or(file.executor) {
            config.executor = ExecutorKind::parse(&executor)?;
        }
        if let Some(host) = lookup(HOST_ENV_VAR).or(file.host) {
            config.remote.host = host.trim().to_string();
        }
        if let Some(user) = lookup(USER_ENV_VAR).or(file.user) {
            config.remote.user = user.trim().to_string();
        }

        let port = match lookup(PORT_ENV_VAR) {
            Some(value) => Some(parse_number::<u16>("port", &value)?),
            None => file.port,
        };
        if let Some(port) = port {
            if port == 0 {
                return Err(invalid("port", port, "must be between 1 and 65535"));
            }
            config.remote.port = port;
        }

        let key_path = lookup(KEY_PATH_ENV_VAR).map(PathBuf::from).or(file.key_path);
        let passphrase = lookup(KEY_PASSPHRASE_ENV_VAR).or(file.key_passphrase);
        let password = lookup(PASSWORD_ENV_VAR).or(file.password);
        config.remote.credential = match (key_path, password) {
            (Some(path), _) => Credential::KeyFile { path, passphrase },
            (None, Some(password)) => Credential::Password(password),
            (None, None) => Credential::None,
        };

        let command_timeout_sec = match lookup(COMMAND_TIMEOUT_ENV_VAR) {
            Some(value) => Some(parse_number::<u64>("command_timeout_sec", &value)?),
            None => file.command_timeout_sec,
        };
        if let Some(seconds) = command_timeout_sec {
            config.command_timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
        }

        let connect_timeout_sec = match lookup(CONNECT_TIMEOUT_ENV_VAR) {
            Some(value) => Some(parse_number::<u64>("connect_timeout_sec", &value)?),
            None => file.connect_timeout_sec,
        };
        if let Some(seconds) = connect_timeout_sec {
            if seconds == 0 {
                return Err(invalid("connect_timeout_sec", seconds, "must be > 0"));
            }
            config.connect_timeout = Duration::from_secs(seconds);
        }

        let redraw_interval_ms = match lookup(REDRAW_INTERVAL_ENV_VAR) {
            Some(value) => Some(parse_number::<u64>("redraw_interval_ms", &value)?),
            None => file.redraw_interval_ms,
        };
        if let Some(millis) = redraw_interval_ms {
            if millis == 0 {
                return Err(invalid("redraw_interval_ms", millis, "must be > 0"));
            }
            config.redraw_interval = Duration::from_millis(millis);
        }

        let shutdown_grace_ms = match lookup(SHUTDOWN_GRACE_ENV_VAR) {
            Some(value) => Some(parse_number::<u64>("shutdown_grace_ms", &value)?),
            None => file.shutdown_grace_ms,
        };
        if let Some(millis) = shutdown_grace_ms {
            config.shutdown_grace = Duration::from_millis(millis);
        }

        config.log_path = lookup(LOG_PATH_ENV_VAR).map(PathBuf::from).or(file.log_path);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.executor != ExecutorKind::Ssh {
            return Ok(());
        }

        if self.remote.host.is_empty() {
            return Err(ConfigError::Missing {
                field: "host",
                executor: "ssh",
            });
        }
        if self.remote.user.is_empty() {
            return Err(ConfigError::Missing {
                field: "user",
                executor: "ssh",
            });
        }
        if self.remote.credential == Credential::None {
            return Err(ConfigError::Missing {
                field: "password or key_path",
                executor: "ssh",
            });
        }

        Ok(())
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        field,
        value: value.to_string(),
        reason: "expected a non-negative integer",
    })
}

fn invalid(field: &'static str, value: impl ToString, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        field,
        value: value.to_string(),
        reason,
    }
}
