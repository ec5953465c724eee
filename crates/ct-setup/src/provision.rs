//! Named tunnel and DNS route provisioning

use ct_core::traits::CommandRunner;
use ct_core::{Domain, SetupError, Settings};

use crate::install::AgentBinary;
use crate::output::{print_info, print_warning};

/// Outcome of `tunnel create`; every variant lets the run continue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelCreation {
    Created,
    AlreadyExists,
    /// Some other failure; the existing-tunnel assumption is kept
    Failed(String),
}

/// Create the named tunnel, treating any failure as benign
pub async fn create_tunnel(
    settings: &Settings,
    agent: &AgentBinary,
    runner: &dyn CommandRunner,
) -> TunnelCreation {
    let name = settings.tunnel_name();
    print_info(&format!("Creating tunnel '{}'...", name));

    let spec = agent.command().args(["tunnel", "create", name]).capture();
    let outcome = match runner.run(&spec).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("tunnel create could not run: {}", e);
            print_warning("Could not create tunnel, continuing with the existing one.");
            return TunnelCreation::Failed(e.to_string());
        }
    };

    if outcome.success() {
        tracing::info!("Created tunnel {}", name);
        return TunnelCreation::Created;
    }

    let combined = format!("{}{}", outcome.stdout, outcome.stderr).to_lowercase();
    if combined.contains("already exists") {
        print_info("(Tunnel already exists, using existing one.)");
        TunnelCreation::AlreadyExists
    } else {
        let detail = outcome.describe_failure();
        tracing::debug!("tunnel create failed: {}", detail);
        print_warning(&format!(
            "Tunnel creation failed ({}); assuming it already exists.",
            detail
        ));
        TunnelCreation::Failed(detail)
    }
}

/// Point `domain` at the named tunnel; any failure is fatal
pub async fn route_dns(
    settings: &Settings,
    agent: &AgentBinary,
    runner: &dyn CommandRunner,
    domain: &Domain,
) -> Result<(), SetupError> {
    print_info(&format!("Pointing {} to this machine...", domain));

    let spec = agent
        .command()
        .args(["tunnel", "route", "dns", "-f", settings.tunnel_name(), domain.as_str()])
        .capture();

    let route_error = |detail: String| SetupError::RouteDns {
        domain: domain.to_string(),
        detail,
    };

    let outcome = runner
        .run(&spec)
        .await
        .map_err(|e| route_error(e.to_string()))?;

    if !outcome.success() {
        return Err(route_error(outcome.stderr.trim().to_string()));
    }

    tracing::info!("Routed {} to tunnel {}", domain, settings.tunnel_name());
    Ok(())
}
