use std::future::Future;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::render_command;
use crate::error::CommandError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured result of one external command. Output is trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

pub trait CommandRunner: Send + Sync {
    /// Runs `program` and captures its output. A non-zero exit status is
    /// reported in the output, not as an error.
    fn output(
        &self,
        program: &str,
        args: &[&str],
    ) -> impl Future<Output = Result<CommandOutput, CommandError>> + Send;

    /// Runs `program` and returns its stdout, failing on a non-zero exit status.
    fn run(
        &self,
        program: &str,
        args: &[&str],
    ) -> impl Future<Output = Result<String, CommandError>> + Send {
        async move {
            let output = self.output(program, args).await?;
            if output.success() {
                Ok(output.stdout)
            } else {
                Err(CommandError::Failed {
                    command: render_command(program, args),
                    status: output.status,
                    stderr: output.stderr,
                })
            }
        }
    }
}

/// Runs real processes through tokio, killing any that outlive the timeout.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    async fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let command = render_command(program, args);
        tracing::trace!("exec: {}", command);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => {
                return Err(CommandError::Timeout {
                    command,
                    timeout: self.timeout,
                })
            }
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CommandError::NotFound {
                    program: program.to_string(),
                })
            }
            Ok(Err(source)) => return Err(CommandError::Io { command, source }),
            Ok(Ok(output)) => output,
        };

        Ok(CommandOutput {
            // Killed by a signal: no exit code.
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let runner = SystemRunner::new();
        let err = runner
            .output("/nonexistent/wifi-toggle-test-binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound { .. }));
    }

    #[tokio::test]
    async fn run_reports_non_zero_exit() {
        let runner = SystemRunner::new();
        let err = runner.run("sh", &["-c", "echo nope >&2; exit 3"]).await.unwrap_err();
        match err {
            CommandError::Failed { status, stderr, .. } => {
                assert_eq!(status, 3);
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let runner = SystemRunner::with_timeout(Duration::from_millis(50));
        let err = runner.output("sleep", &["5"]).await.unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[tokio::test]
    async fn output_is_trimmed() {
        let runner = SystemRunner::new();
        let out = runner.run("echo", &["  hello  "]).await.unwrap();
        assert_eq!(out, "hello");
    }
}
