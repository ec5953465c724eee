//! Resolved, immutable settings for one run

use std::path::{Path, PathBuf};

use super::SetupConfig;
use crate::error::ConfigError;

/// Credential file written by `cloudflared tunnel login`
const CREDENTIAL_FILE_NAME: &str = "cert.pem";

/// Settings derived once at startup and passed to every setup step
#[derive(Debug, Clone)]
pub struct Settings {
    config: SetupConfig,
    credentials_dir: PathBuf,
    credential_file: PathBuf,
}

impl Settings {
    /// Resolve settings against an explicit home directory
    pub fn resolve(config: SetupConfig, home_dir: PathBuf) -> Self {
        let credentials_dir = config
            .agent
            .credentials_dir
            .clone()
            .unwrap_or_else(|| home_dir.join(".cloudflared"));
        let credential_file = credentials_dir.join(CREDENTIAL_FILE_NAME);

        Self {
            config,
            credentials_dir,
            credential_file,
        }
    }

    /// Resolve settings against the current user's home directory
    pub fn from_env(config: SetupConfig) -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::MissingHome)?;
        Ok(Self::resolve(config, home))
    }

    pub fn config(&self) -> &SetupConfig {
        &self.config
    }

    pub fn credentials_dir(&self) -> &Path {
        &self.credentials_dir
    }

    pub fn credential_file(&self) -> &Path {
        &self.credential_file
    }

    pub fn tunnel_name(&self) -> &str {
        &self.config.tunnel_name
    }

    /// Arguments for launching the editing server
    pub fn editor_args(&self) -> Vec<String> {
        vec![
            "--auth".to_string(),
            "none".to_string(),
            "--bind-addr".to_string(),
            self.config.editor.bind_address.clone(),
        ]
    }

    /// Local URL the tunnel forwards to
    pub fn editor_service_url(&self) -> String {
        format!("http://{}", self.config.editor.bind_address)
    }
}
