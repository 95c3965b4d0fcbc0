/*!
 * Error types
 * One enum per concern; the binary wraps them in anyhow
 */

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("cannot resolve the home directory")]
    NoHome,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command not found: {program}")]
    NotFound { program: String },

    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` exited with status {status}: {stderr}")]
    Failed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("failed to run `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum RadioError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("unexpected Wi-Fi power output: {0:?}")]
    UnexpectedOutput(String),

    #[error("Wi-Fi power was set {requested} but reads back {actual}")]
    NotApplied {
        requested: &'static str,
        actual: &'static str,
    },
}
