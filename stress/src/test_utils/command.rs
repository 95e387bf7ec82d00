use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::ErrorKind;
use crate::migration::command::{CapturedOutput, CommandInvocation, CommandRunner, CommandSpec};
use crate::stress_error;

/// How a [`FakeCommandRunner`] behaves when invoked.
#[derive(Debug, Clone)]
pub enum FakeCommandBehavior {
    /// Exits successfully after `delay`, printing `lines`.
    Succeed { lines: Vec<String>, delay: Duration },
    /// Fails before producing any output, like a missing executable.
    FailToStart,
    /// Never exits.
    Hang,
}

/// Command runner recording the commands it receives instead of running them.
#[derive(Debug, Clone)]
pub struct FakeCommandRunner {
    behavior: FakeCommandBehavior,
    invocations: Arc<Mutex<Vec<CommandSpec>>>,
}

impl FakeCommandRunner {
    pub fn new(behavior: FakeCommandBehavior) -> Self {
        Self {
            behavior,
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn succeeding(lines: &[&str]) -> Self {
        Self::new(FakeCommandBehavior::Succeed {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            delay: Duration::ZERO,
        })
    }

    pub fn failing_to_start() -> Self {
        Self::new(FakeCommandBehavior::FailToStart)
    }

    pub fn hanging() -> Self {
        Self::new(FakeCommandBehavior::Hang)
    }

    /// Returns the commands received so far.
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeCommandRunner {
    async fn invoke(&self, spec: &CommandSpec) -> CommandInvocation {
        self.invocations.lock().unwrap().push(spec.clone());

        match &self.behavior {
            FakeCommandBehavior::Succeed { lines, delay } => {
                tokio::time::sleep(*delay).await;
                CommandInvocation::succeeded(CapturedOutput::new(lines.clone()))
            }
            FakeCommandBehavior::FailToStart => CommandInvocation::failed(
                CapturedOutput::default(),
                stress_error!(
                    ErrorKind::CommandSpawnFailed,
                    "Failed to start the command",
                    spec.to_string()
                ),
            ),
            FakeCommandBehavior::Hang => {
                std::future::pending::<()>().await;
                CommandInvocation::succeeded(CapturedOutput::default())
            }
        }
    }
}
