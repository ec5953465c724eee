//! Host process execution backed by tokio

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::error::SetupError;
use crate::traits::{ChildProcess, CommandRunner};
use crate::types::{CommandOutcome, CommandSpec, StdioMode};

/// Runs commands on the local host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);

        match spec.stdio {
            StdioMode::Inherit => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            StdioMode::Null => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
            }
            StdioMode::Capture => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
        }

        cmd
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> SetupError {
        SetupError::Spawn {
            program: spec.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome, SetupError> {
        tracing::debug!("Running: {}", spec);
        let mut cmd = Self::command(spec);

        let outcome = if spec.stdio == StdioMode::Capture {
            let output = cmd
                .output()
                .await
                .map_err(|e| Self::spawn_error(spec, e))?;
            CommandOutcome {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
        } else {
            let status = cmd
                .status()
                .await
                .map_err(|e| Self::spawn_error(spec, e))?;
            CommandOutcome {
                code: status.code(),
                ..CommandOutcome::default()
            }
        };

        tracing::debug!("{} exited with {:?}", spec.program, outcome.code);
        Ok(outcome)
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ChildProcess>, SetupError> {
        tracing::debug!("Spawning: {}", spec);
        let child = Self::command(spec)
            .spawn()
            .map_err(|e| Self::spawn_error(spec, e))?;
        tracing::info!("Started {} (PID: {:?})", spec.program, child.id());

        Ok(Box::new(SystemChild {
            program: spec.program.clone(),
            child,
        }))
    }
}

/// Handle to a process started by [`SystemRunner`]
#[derive(Debug)]
pub struct SystemChild {
    program: String,
    child: Child,
}

#[async_trait]
impl ChildProcess for SystemChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn terminate(&mut self) {
        let Some(pid) = self.child.id() else {
            // Already reaped
            return;
        };
        tracing::debug!("Terminating {} (PID: {})", self.program, pid);
        send_terminate(&mut self.child, pid);
    }

    async fn wait(&mut self) -> Result<Option<i32>, SetupError> {
        let status = self.child.wait().await?;
        Ok(status.code())
    }
}

/// SIGTERM, matching what an interactive shell sends on `kill`
#[cfg(unix)]
fn send_terminate(_child: &mut Child, pid: u32) {
    // SAFETY: kill(2) has no memory-safety preconditions
    let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if result != 0 {
        tracing::debug!(
            "kill({}) failed: {}",
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child, pid: u32) {
    if let Err(e) = child.start_kill() {
        tracing::debug!("Failed to kill PID {}: {}", pid, e);
    }
}
