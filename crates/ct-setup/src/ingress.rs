//! Optional ingress file for the named tunnel
//!
//! `tunnel run <name>` reads `config.yml` from the credentials directory.
//! When enabled, the file is written to send the routed hostname to the
//! local editing server.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use ct_core::traits::CommandRunner;
use ct_core::{Domain, SetupError, Settings};

use crate::install::AgentBinary;

/// Entry of `tunnel list --output json`
#[derive(Debug, Deserialize)]
struct TunnelEntry {
    id: String,
    name: String,
}

/// Look up the id of the configured tunnel
pub async fn lookup_tunnel_id(
    settings: &Settings,
    agent: &AgentBinary,
    runner: &dyn CommandRunner,
) -> Result<Option<String>, SetupError> {
    let name = settings.tunnel_name();
    let spec = agent
        .command()
        .args(["tunnel", "list", "--output", "json", "--name", name])
        .capture();

    let outcome = runner.run(&spec).await?;
    if !outcome.success() {
        tracing::warn!("tunnel list failed: {}", outcome.describe_failure());
        return Ok(None);
    }

    Ok(parse_tunnel_id(&outcome.stdout, name))
}

/// Find `name` in the JSON tunnel listing
fn parse_tunnel_id(json: &str, name: &str) -> Option<String> {
    let entries: Vec<TunnelEntry> = match serde_json::from_str(json) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to parse tunnel list JSON: {}", e);
            return None;
        }
    };

    entries
        .into_iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.id)
}

/// Render the ingress file for `tunnel_id`
pub fn render_ingress(settings: &Settings, tunnel_id: &str, domain: &Domain) -> String {
    let creds_dir = settings.credentials_dir().display();
    format!(
        r#"tunnel: {id}
credentials-file: {creds}/{id}.json

ingress:
  - hostname: {domain}
    service: {service}
  - service: http_status:404
"#,
        id = tunnel_id,
        creds = creds_dir,
        domain = domain,
        service = settings.editor_service_url(),
    )
}

/// Write `config.yml` next to the credentials, returning its path
///
/// Returns `Ok(None)` when the tunnel id cannot be determined.
pub async fn write_ingress(
    settings: &Settings,
    agent: &AgentBinary,
    runner: &dyn CommandRunner,
    domain: &Domain,
) -> Result<Option<PathBuf>, SetupError> {
    let Some(tunnel_id) = lookup_tunnel_id(settings, agent, runner).await? else {
        return Ok(None);
    };

    fs::create_dir_all(settings.credentials_dir())?;
    let path = settings.credentials_dir().join("config.yml");
    fs::write(&path, render_ingress(settings, &tunnel_id, domain))?;

    tracing::info!("Ingress configuration written to {}", path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{settings_in, FakeRunner};
    use tempfile::TempDir;

    const LISTING: &str = r#"[
        {"id": "6ff42ae2-765d-4adf-8112-31c55c1551ef", "name": "vscode-node", "created_at": "2024-01-01T00:00:00Z", "connections": []},
        {"id": "aaaa", "name": "other"}
    ]"#;

    fn agent() -> AgentBinary {
        AgentBinary::System("cloudflared".into())
    }

    #[test]
    fn test_parse_tunnel_id() {
        assert_eq!(
            parse_tunnel_id(LISTING, "vscode-node").as_deref(),
            Some("6ff42ae2-765d-4adf-8112-31c55c1551ef")
        );
        assert_eq!(parse_tunnel_id(LISTING, "missing"), None);
        assert_eq!(parse_tunnel_id("not json", "vscode-node"), None);
    }

    #[test]
    fn test_render_ingress() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let domain = Domain::parse("code.example.com").unwrap();

        let rendered = render_ingress(&settings, "abc", &domain);
        let creds = settings.credentials_dir().display().to_string();

        assert!(rendered.starts_with("tunnel: abc\n"));
        assert!(rendered.contains(&format!("credentials-file: {}/abc.json", creds)));
        assert!(rendered.contains("  - hostname: code.example.com\n    service: http://127.0.0.1:8080\n"));
        assert!(rendered.ends_with("  - service: http_status:404\n"));
    }

    #[tokio::test]
    async fn test_write_ingress() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new().stdout("cloudflared tunnel list", LISTING);
        let domain = Domain::parse("code.example.com").unwrap();

        let path = write_ingress(&settings, &agent(), &runner, &domain)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(path, settings.credentials_dir().join("config.yml"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("tunnel: 6ff42ae2-765d-4adf-8112-31c55c1551ef"));
        assert_eq!(
            runner.calls(),
            vec!["cloudflared tunnel list --output json --name vscode-node"]
        );
    }

    #[tokio::test]
    async fn test_write_ingress_without_tunnel() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new().stdout("cloudflared tunnel list", "[]");
        let domain = Domain::parse("code.example.com").unwrap();

        let result = write_ingress(&settings, &agent(), &runner, &domain)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(!settings.credentials_dir().join("config.yml").exists());
    }
}
