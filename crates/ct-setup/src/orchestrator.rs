//! Linear setup flow from installation to running services

use std::fmt;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use ct_core::platform::{Arch, Os};
use ct_core::traits::{CommandRunner, Fetcher};
use ct_core::{Domain, SetupError, Settings};

use crate::auth::ensure_authenticated;
use crate::install::{ensure_agent, ensure_editor, AgentBinary};
use crate::ingress::write_ingress;
use crate::output::{print_heading, print_warning};
use crate::prompt::prompt_domain_until;
use crate::provision::{create_tunnel, route_dns};
use crate::services::{Services, Shutdown};

/// Progress through a run; each state is entered at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetupState {
    Uninitialized,
    EditorReady,
    TunnelBinaryReady,
    Authenticated,
    Configured,
    Provisioned,
    Running,
    Stopped,
}

impl fmt::Display for SetupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupState::Uninitialized => "uninitialized",
            SetupState::EditorReady => "editor-ready",
            SetupState::TunnelBinaryReady => "tunnel-binary-ready",
            SetupState::Authenticated => "authenticated",
            SetupState::Configured => "configured",
            SetupState::Provisioned => "provisioned",
            SetupState::Running => "running",
            SetupState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Where the public domain comes from
#[derive(Debug, Clone)]
pub enum DomainSource {
    /// Given up front, e.g. on the command line
    Fixed(String),
    /// Asked for on stdin
    Prompt,
}

impl DomainSource {
    async fn resolve(&self, cancel: &CancellationToken) -> Result<Domain, SetupError> {
        match self {
            DomainSource::Fixed(value) => Domain::parse(value),
            DomainSource::Prompt => {
                prompt_domain_until(BufReader::new(std::io::stdin()), std::io::stdout(), cancel)
                    .await
            }
        }
    }
}

/// Values produced by the setup phase and consumed by the launch
struct Prepared {
    agent: AgentBinary,
    domain: Domain,
    ingress: Option<PathBuf>,
}

/// Drives a single setup run
pub struct Orchestrator {
    settings: Settings,
    runner: Arc<dyn CommandRunner>,
    fetcher: Arc<dyn Fetcher>,
    os: Os,
    arch: Arch,
    state: SetupState,
}

impl Orchestrator {
    pub fn new(
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            settings,
            runner,
            fetcher,
            os: Os::current(),
            arch: Arch::current(),
            state: SetupState::Uninitialized,
        }
    }

    /// Override host detection
    pub fn with_host(mut self, os: Os, arch: Arch) -> Self {
        self.os = os;
        self.arch = arch;
        self
    }

    pub fn state(&self) -> SetupState {
        self.state
    }

    fn advance(&mut self, next: SetupState) {
        debug_assert!(next > self.state, "setup never moves backwards");
        tracing::debug!("Setup state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run every step, then keep the services up until interrupted
    ///
    /// An interrupt before launch aborts with `SetupError::Interrupted`, also
    /// while a step is still waiting on a command or on the prompt.
    pub async fn run(
        &mut self,
        domain: DomainSource,
        cancel: CancellationToken,
    ) -> Result<Shutdown, SetupError> {
        let prepared = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SetupError::Interrupted),
            result = self.prepare(&domain, &cancel) => result?,
        };

        let runner = Arc::clone(&self.runner);
        let services = Services::launch(
            &self.settings,
            &prepared.agent,
            runner.as_ref(),
            &prepared.domain,
            prepared.ingress.as_deref(),
        )
        .await?;
        self.advance(SetupState::Running);

        let shutdown = services.run_until(cancel).await;
        self.advance(SetupState::Stopped);
        Ok(shutdown)
    }

    async fn prepare(
        &mut self,
        domain: &DomainSource,
        cancel: &CancellationToken,
    ) -> Result<Prepared, SetupError> {
        let runner = Arc::clone(&self.runner);
        let fetcher = Arc::clone(&self.fetcher);
        let runner = runner.as_ref();

        print_heading("Step 1: code-server");
        ensure_editor(&self.settings, runner).await?;
        self.advance(SetupState::EditorReady);

        print_heading("Step 2: cloudflared");
        let agent = ensure_agent(
            &self.settings,
            runner,
            fetcher.as_ref(),
            &self.os,
            self.arch,
        )
        .await?;
        self.advance(SetupState::TunnelBinaryReady);

        ensure_authenticated(&self.settings, &agent, runner).await?;
        self.advance(SetupState::Authenticated);

        print_heading("CONFIGURATION");
        let domain = domain.resolve(cancel).await?;
        self.advance(SetupState::Configured);

        create_tunnel(&self.settings, &agent, runner).await;
        route_dns(&self.settings, &agent, runner, &domain).await?;

        let mut ingress = None;
        if self.settings.config().write_ingress {
            match write_ingress(&self.settings, &agent, runner, &domain).await {
                Ok(Some(path)) => ingress = Some(path),
                Ok(None) => print_warning("Could not find the tunnel id; ingress file not written."),
                Err(e) => print_warning(&format!("Failed to write ingress file: {}", e)),
            }
        }
        self.advance(SetupState::Provisioned);

        Ok(Prepared {
            agent,
            domain,
            ingress,
        })
    }
}
