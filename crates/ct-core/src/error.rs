//! Core error types for code-tunnel

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the setup flow
///
/// Every variant is fatal for the run. Failures that the flow recovers from
/// (a missing binary, an existing tunnel) never surface as a `SetupError`.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The editing server install script failed
    #[error("Failed to install code-server: {0}")]
    EditorInstall(String),

    /// The tunnel agent could not be downloaded or unpacked
    #[error("Failed to install cloudflared: {0}")]
    AgentInstall(String),

    /// HTTP download failed
    #[error("Download of {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Interactive login did not complete
    #[error("Login interrupted: {0}")]
    LoginFailed(String),

    /// Operator supplied an empty domain
    #[error("Domain is required")]
    DomainRequired,

    /// DNS route could not be attached to the tunnel
    #[error(
        "Failed to route DNS. Make sure '{domain}' is valid and added to your Cloudflare account.{}",
        format_detail(.detail)
    )]
    RouteDns { domain: String, detail: String },

    /// A command could not be started at all
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Interrupt received before the services were running
    #[error("Interrupted before setup completed")]
    Interrupted,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SetupError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            SetupError::Interrupted => 130,
            _ => 1,
        }
    }
}

fn format_detail(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({})", detail)
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// No home directory for the current user
    #[error("Could not determine the home directory")]
    MissingHome,
}
