//! On-disk setup configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration file contents for a setup run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Name of the tunnel resource created in the Cloudflare account
    pub tunnel_name: String,

    /// Write an ingress `config.yml` next to the tunnel credentials
    pub write_ingress: bool,

    /// Editing server settings
    pub editor: EditorConfig,

    /// Tunnel agent settings
    pub agent: AgentConfig,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            tunnel_name: "vscode-node".to_string(),
            write_ingress: false,
            editor: EditorConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

/// Editing server (code-server) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Binary name or path
    pub binary: String,

    /// Loopback address the server binds to
    pub bind_address: String,

    /// Install script piped to `sh` when the binary is missing
    pub install_script_url: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            binary: "code-server".to_string(),
            bind_address: "127.0.0.1:8080".to_string(),
            install_script_url: "https://code-server.dev/install.sh".to_string(),
        }
    }
}

impl EditorConfig {
    /// Port component of the bind address
    pub fn port(&self) -> Option<u16> {
        self.bind_address
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
    }
}

/// Tunnel agent (cloudflared) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Binary name looked up on PATH
    pub binary: String,

    /// Base URL release artifacts are downloaded from
    pub release_base_url: String,

    /// Directory a downloaded binary is written to
    pub install_dir: PathBuf,

    /// Overrides `<home>/.cloudflared`
    pub credentials_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: "cloudflared".to_string(),
            release_base_url:
                "https://github.com/cloudflare/cloudflared/releases/latest/download".to_string(),
            install_dir: PathBuf::from("."),
            credentials_dir: None,
        }
    }
}
