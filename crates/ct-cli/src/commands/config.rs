//! Config command implementations

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use ct_core::config::{self, SetupConfig};

/// Load the setup configuration
///
/// An explicit path must exist and parse. The default path is optional; a
/// broken default file is reported and replaced by built-in defaults.
pub fn load_setup_config(config_path: Option<&PathBuf>) -> Result<SetupConfig> {
    if let Some(path) = config_path {
        return config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(config::load_config(&default_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
            SetupConfig::default()
        }))
    } else {
        tracing::info!("Using default configuration");
        Ok(SetupConfig::default())
    }
}

/// Show current configuration
pub fn config_show(config_path: Option<&PathBuf>) -> Result<()> {
    let path = config_path
        .cloned()
        .unwrap_or_else(config::default_config_path);

    if !path.exists() {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Using built-in defaults. Run 'code-tunnel config init' to create one");
        println!();
        println!("{}", toml_string(&SetupConfig::default())?);
        return Ok(());
    }

    print_info(&format!("Configuration file: {:?}", path));
    println!();

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    println!("{}", content);

    Ok(())
}

/// Initialize default configuration
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let config_file = config_path
        .cloned()
        .unwrap_or_else(config::default_config_path);

    if let Some(config_dir) = config_file.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            std::fs::create_dir_all(config_dir).with_context(|| {
                format!("Failed to create config directory: {:?}", config_dir)
            })?;
            print_success(&format!("Created config directory: {:?}", config_dir));
        }
    }

    if config_file.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", config_file));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(&config_file, generate_default_config())
        .with_context(|| format!("Failed to write config file: {:?}", config_file))?;

    print_success(&format!("Created configuration file: {:?}", config_file));
    Ok(())
}

fn toml_string(config: &SetupConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}

/// Generate default configuration content
fn generate_default_config() -> String {
    r#"# code-tunnel Configuration

# Name of the Cloudflare tunnel to create and run
tunnel_name = "vscode-node"

# Write ~/.cloudflared/config.yml routing the domain to code-server
write_ingress = false

[editor]
binary = "code-server"
bind_address = "127.0.0.1:8080"
install_script_url = "https://code-server.dev/install.sh"

[agent]
binary = "cloudflared"
release_base_url = "https://github.com/cloudflare/cloudflared/releases/latest/download"
# Where a downloaded cloudflared is written
install_dir = "."
# credentials_dir = "/home/me/.cloudflared"
"#
    .to_string()
}
