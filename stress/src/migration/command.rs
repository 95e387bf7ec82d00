use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::info;

use crate::error::{ErrorKind, StressError, StressResult};
use crate::stress_error;

/// Program and arguments of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }

        Ok(())
    }
}

/// Standard output of a command, line by line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    lines: Vec<String>,
}

impl CapturedOutput {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// What a command produced, together with how it ended.
///
/// The output is kept even when the command failed, since partial output often explains the
/// failure.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub output: CapturedOutput,
    pub result: StressResult<()>,
}

impl CommandInvocation {
    pub fn succeeded(output: CapturedOutput) -> Self {
        Self {
            output,
            result: Ok(()),
        }
    }

    pub fn failed(output: CapturedOutput, error: StressError) -> Self {
        Self {
            output,
            result: Err(error),
        }
    }
}

/// Runs external commands on behalf of the migration trigger.
///
/// Implementations never fail as a whole: failures are reported in
/// [`CommandInvocation::result`] next to whatever output was captured.
pub trait CommandRunner: Send + Sync + 'static {
    /// Runs `spec` until it exits and returns its captured output.
    fn invoke(&self, spec: &CommandSpec) -> impl Future<Output = CommandInvocation> + Send;
}

/// Runs commands as operating system processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    async fn invoke(&self, spec: &CommandSpec) -> CommandInvocation {
        let mut output = CapturedOutput::default();

        let spawned = Command::new(spec.program())
            .args(spec.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                let error = stress_error!(
                    ErrorKind::CommandSpawnFailed,
                    "Failed to start the command",
                    spec.to_string(),
                    source: err
                );
                return CommandInvocation::failed(output, error);
            }
        };

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => output.push_line(line),
                    Ok(None) => break,
                    Err(err) => {
                        let error = stress_error!(
                            ErrorKind::CommandIoFailed,
                            "Failed to read the command output",
                            spec.to_string(),
                            source: err
                        );
                        return CommandInvocation::failed(output, error);
                    }
                }
            }
        }

        match child.wait().await {
            Ok(status) if status.success() => CommandInvocation::succeeded(output),
            Ok(status) => {
                let error = stress_error!(
                    ErrorKind::CommandFailed,
                    "Command exited unsuccessfully",
                    format!("{spec} exited with {status}")
                );
                CommandInvocation::failed(output, error)
            }
            Err(err) => {
                let error = stress_error!(
                    ErrorKind::CommandIoFailed,
                    "Failed to wait for the command",
                    spec.to_string(),
                    source: err
                );
                CommandInvocation::failed(output, error)
            }
        }
    }
}

/// Logs commands instead of running them.
///
/// Used when the workload targets the in-memory store, so that a dry run never reaches the
/// administrative tooling of a real cluster.
#[derive(Debug, Clone, Default)]
pub struct DryRunCommandRunner;

impl CommandRunner for DryRunCommandRunner {
    async fn invoke(&self, spec: &CommandSpec) -> CommandInvocation {
        info!(command = %spec, "dry run, command not executed");

        CommandInvocation::succeeded(CapturedOutput::default())
    }
}
