//! code-tunnel CLI
//!
//! Single binary that provisions a remote code-editing environment:
//! - `up` installs code-server and cloudflared, routes a domain and runs both
//! - `status` reports what is installed
//! - `config` manages the configuration file

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use code_tunnel::commands::{self, UpOptions};
use ct_core::process::SystemRunner;
use ct_core::Settings;

#[derive(Parser)]
#[command(name = "code-tunnel")]
#[command(author, version, about = "Expose code-server through a Cloudflare tunnel")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install, authenticate, route the domain and run the editor tunnel
    /// (default when no command is given)
    Up {
        /// Public domain to route (prompted for when omitted)
        #[arg(short, long)]
        domain: Option<String>,
        /// Tunnel name (overrides config)
        #[arg(short, long)]
        tunnel_name: Option<String>,
        /// Local code-server port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Write ~/.cloudflared/config.yml pointing the domain at code-server
        #[arg(long)]
        write_ingress: bool,
    },

    /// Show which components are installed and authenticated
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let command = cli.command.unwrap_or(Commands::Up {
        domain: None,
        tunnel_name: None,
        port: None,
        write_ingress: false,
    });

    match command {
        Commands::Up {
            domain,
            tunnel_name,
            port,
            write_ingress,
        } => {
            let config = commands::load_setup_config(cli.config.as_ref())?;
            let options = UpOptions {
                domain,
                tunnel_name,
                port,
                write_ingress,
            };
            let code = commands::up_command(config, &options).await?;
            // A prompt thread may still be parked on stdin after an interrupt
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Status => {
            let config = commands::load_setup_config(cli.config.as_ref())?;
            let settings = Settings::from_env(config)?;
            commands::status_command(&settings, &SystemRunner::new()).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(cli.config.as_ref())?;
            }
            ConfigAction::Init { force } => {
                commands::config_init(cli.config.as_ref(), force)?;
            }
            ConfigAction::Path => {
                let path = cli
                    .config
                    .unwrap_or_else(ct_core::config::default_config_path);
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}
