//! Status command implementation

use anyhow::Result;

use ct_core::traits::CommandRunner;
use ct_core::Settings;
use ct_setup::auth::has_credentials;
use ct_setup::probe;

use crate::output::{format_components, ComponentStatus};

/// Inspect the installation without changing anything
pub async fn collect_status(
    settings: &Settings,
    runner: &dyn CommandRunner,
) -> Vec<ComponentStatus> {
    let config = settings.config();
    let mut components = Vec::new();

    let editor_ready = probe(runner, &config.editor.binary).await;
    components.push(ComponentStatus::new(
        "code-server",
        editor_ready,
        config.editor.binary.as_str(),
    ));

    let local_agent = config.agent.install_dir.join(&config.agent.binary);
    let local_agent = local_agent.to_string_lossy().into_owned();
    let agent = if probe(runner, &config.agent.binary).await {
        Some(config.agent.binary.clone())
    } else if probe(runner, &local_agent).await {
        Some(local_agent)
    } else {
        None
    };
    components.push(ComponentStatus::new(
        "cloudflared",
        agent.is_some(),
        agent.unwrap_or_else(|| config.agent.binary.clone()),
    ));

    components.push(ComponentStatus::new(
        "credentials",
        has_credentials(settings),
        settings.credential_file().display().to_string(),
    ));

    components
}

/// Execute the status command
pub async fn status_command(settings: &Settings, runner: &dyn CommandRunner) -> Result<()> {
    let components = collect_status(settings, runner).await;

    println!("{}", format_components(&components));
    println!("Tunnel name: {}", settings.tunnel_name());
    println!("Editor address: {}", settings.editor_service_url());

    Ok(())
}
