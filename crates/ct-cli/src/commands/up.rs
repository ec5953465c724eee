//! `up` command: run the full setup flow

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use ct_core::http::HttpFetcher;
use ct_core::process::SystemRunner;
use ct_core::{SetupConfig, Settings};
use ct_setup::{install_signal_handler, DomainSource, Orchestrator, Shutdown};

use crate::output::{print_error, print_info};

/// Command-line overrides for a run
#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    pub domain: Option<String>,
    pub tunnel_name: Option<String>,
    pub port: Option<u16>,
    pub write_ingress: bool,
}

impl UpOptions {
    /// Fold the overrides into the loaded configuration
    pub fn apply(&self, mut config: SetupConfig) -> SetupConfig {
        if let Some(name) = &self.tunnel_name {
            config.tunnel_name = name.clone();
        }
        if let Some(port) = self.port {
            config.editor.bind_address = format!("127.0.0.1:{}", port);
        }
        if self.write_ingress {
            config.write_ingress = true;
        }
        config
    }

    fn domain_source(&self) -> DomainSource {
        match &self.domain {
            Some(domain) => DomainSource::Fixed(domain.clone()),
            None => DomainSource::Prompt,
        }
    }
}

/// Run the setup flow and return the process exit code
pub async fn up_command(config: SetupConfig, options: &UpOptions) -> Result<i32> {
    let settings = Settings::from_env(options.apply(config))
        .context("Failed to resolve settings")?;
    tracing::debug!("Resolved settings: {:?}", settings);

    let cancel = CancellationToken::new();
    install_signal_handler(cancel.clone());

    print_info("Setting up code-server with Cloudflare...");

    let mut orchestrator = Orchestrator::new(
        settings,
        Arc::new(SystemRunner::new()),
        Arc::new(HttpFetcher::new()),
    );

    match orchestrator.run(options.domain_source(), cancel).await {
        Ok(shutdown) => {
            if let Shutdown::AgentExited(code) = shutdown {
                print_info(&format!("Tunnel agent exited ({:?}), stopped code-server", code));
            }
            Ok(shutdown.exit_code())
        }
        Err(e) => {
            tracing::debug!("Setup failed in state {}: {:?}", orchestrator.state(), e);
            print_error(&e.to_string());
            Ok(e.exit_code())
        }
    }
}
