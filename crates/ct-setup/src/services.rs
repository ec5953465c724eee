//! Launch of the editing server and tunnel agent, and their shutdown

use std::path::Path;

use tokio_util::sync::CancellationToken;

use ct_core::traits::{ChildProcess, CommandRunner};
use ct_core::{CommandSpec, Domain, SetupError, Settings};

use crate::install::AgentBinary;
use crate::output::{print_heading, print_info, print_success};

/// How the running services came to a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Interrupt received; both children were asked to terminate
    Interrupted,
    /// The tunnel agent exited by itself with this code
    AgentExited(Option<i32>),
}

impl Shutdown {
    /// Exit status for the orchestrating process
    pub fn exit_code(&self) -> i32 {
        match self {
            Shutdown::Interrupted => 0,
            Shutdown::AgentExited(code) => code.unwrap_or(1),
        }
    }
}

/// Message shown once the tunnel is up
pub fn running_banner(domain: &Domain) -> String {
    format!("Tunnel running! Access your code at: {}", domain.public_url())
}

/// The two long-running children, owned together
pub struct Services {
    editor: Box<dyn ChildProcess>,
    agent: Box<dyn ChildProcess>,
}

impl Services {
    /// Start the editing server in the background and the agent in the foreground
    ///
    /// `ingress` is handed to the agent with `--config` when an ingress file
    /// was written for this run.
    pub async fn launch(
        settings: &Settings,
        agent: &AgentBinary,
        runner: &dyn CommandRunner,
        domain: &Domain,
        ingress: Option<&Path>,
    ) -> Result<Self, SetupError> {
        print_heading("STARTING SERVERS...");

        let editor_config = &settings.config().editor;
        let editor_spec = CommandSpec::new(editor_config.binary.as_str())
            .args(settings.editor_args())
            .quiet();
        let mut editor = runner.spawn(&editor_spec).await?;

        match editor_config.port() {
            Some(port) => print_success(&format!("VS Code Server running on port {}", port)),
            None => print_success(&format!(
                "VS Code Server running on {}",
                editor_config.bind_address
            )),
        }

        print_success(&running_banner(domain));
        print_info("(Press Ctrl+C to stop)");

        let mut agent_spec = agent.command().arg("tunnel");
        if let Some(path) = ingress {
            agent_spec = agent_spec.arg("--config").arg(path.display().to_string());
        }
        let agent_spec = agent_spec
            .args(["run", settings.tunnel_name()])
            .inherit();
        let agent = match runner.spawn(&agent_spec).await {
            Ok(child) => child,
            Err(e) => {
                // Nothing else owns the editor once we bail out
                editor.terminate();
                return Err(e);
            }
        };

        Ok(Self { editor, agent })
    }

    /// Wait for an interrupt or for the agent to exit, then stop both
    pub async fn run_until(mut self, cancel: CancellationToken) -> Shutdown {
        let shutdown = tokio::select! {
            _ = cancel.cancelled() => Shutdown::Interrupted,
            result = self.agent.wait() => {
                let code = result.unwrap_or_else(|e| {
                    tracing::warn!("Failed to wait on tunnel agent: {}", e);
                    None
                });
                tracing::info!("Tunnel agent exited with {:?}", code);
                Shutdown::AgentExited(code)
            }
        };

        if shutdown == Shutdown::Interrupted {
            print_info("Stopping...");
            self.agent.terminate();
        }
        self.editor.terminate();

        shutdown
    }
}

/// Cancel `cancel` on Ctrl+C or SIGTERM
pub fn install_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel.cancel();
    });
}
