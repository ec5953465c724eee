//! Command execution traits

use async_trait::async_trait;

use crate::error::SetupError;
use crate::types::{CommandOutcome, CommandSpec};

/// Abstraction over running external programs
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    ///
    /// A non-zero exit is reported through the outcome. A program that could
    /// not be started at all is `SetupError::Spawn`.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome, SetupError>;

    /// Start a long-running command without waiting for it
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ChildProcess>, SetupError>;
}

/// A running child owned by the setup flow
#[async_trait]
pub trait ChildProcess: Send {
    /// OS process id, if still known
    fn id(&self) -> Option<u32>;

    /// Ask the process to stop; no confirmation and no escalation
    fn terminate(&mut self);

    /// Wait for the process to exit, returning its exit code
    async fn wait(&mut self) -> Result<Option<i32>, SetupError>;
}
