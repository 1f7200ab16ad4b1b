//! Subprocess capability used by every strategy.
//!
//! The planner only sees `CommandRunner`; `ProcessRunner` is the real
//! implementation backed by `tokio::process`. Children are spawned with
//! `kill_on_drop`, so dropping an in-flight run (timeout or interrupt) kills
//! the process instead of orphaning it.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Program plus arguments, without any shell interpretation.
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Build from an argv prefix (e.g. `["npx", "eslint"]`) and extra args.
    pub fn from_argv<I, S>(argv: &[String], extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut it = argv.iter();
        let program = it.next().cloned().unwrap_or_default();
        let mut args: Vec<String> = it.cloned().collect();
        args.extend(extra.into_iter().map(Into::into));
        Self { program, args }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// What a finished process reported.
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

#[derive(Debug, Error)]
/// A command that did not run to completion.
pub enum ExecError {
    /// The program could not be found; the collaborator is unavailable.
    #[error("command not found: {program}")]
    NotFound { program: String },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

/// Runs commands as child processes in the repository root.
pub struct ProcessRunner {
    cwd: PathBuf,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(cwd: &Path, timeout: Duration) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            timeout,
        }
    }

    #[cfg(windows)]
    fn build_command(&self, cmd: &CommandSpec) -> Command {
        // npx/pnpm and friends are .cmd shims on Windows and need cmd.exe.
        let mut command = Command::new("cmd");
        command.arg("/C").arg(&cmd.program).args(&cmd.args);
        command
    }

    #[cfg(not(windows))]
    fn build_command(&self, cmd: &CommandSpec) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        command
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let start = Instant::now();
        debug!(cmd = %cmd, dir = %self.cwd.display(), "Running command");

        let mut command = self.build_command(cmd);
        command
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ExecError::NotFound {
                    program: cmd.program.clone(),
                }
            } else {
                ExecError::Io {
                    program: cmd.program.clone(),
                    source,
                }
            }
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ExecError::Io {
                    program: cmd.program.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(ExecError::Timeout {
                    program: cmd.program.clone(),
                    secs: self.timeout.as_secs(),
                })
            }
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(cmd = %cmd, duration_ms, status = ?output.status.code(), "Command finished");

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if cfg!(windows) && shell_reported_missing(output.status.code(), &stderr) {
            return Err(ExecError::NotFound {
                program: cmd.program.clone(),
            });
        }

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}

/// `cmd.exe` exit code for a command it could not resolve.
const CMD_NOT_RECOGNIZED: i32 = 9009;

/// Whether `cmd /C` failed because the program itself does not exist.
fn shell_reported_missing(code: Option<i32>, stderr: &str) -> bool {
    code == Some(CMD_NOT_RECOGNIZED)
        || (code != Some(0) && stderr.contains("is not recognized as an internal or external command"))
}
