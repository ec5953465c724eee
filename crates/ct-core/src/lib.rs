//! ct-core: Core abstractions and configuration for code-tunnel
//!
//! This crate provides the configuration, error types, host detection and
//! command-execution seams shared by the setup flow and the CLI.

pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod platform;
pub mod process;
pub mod traits;
pub mod types;

pub use config::{SetupConfig, Settings};
pub use domain::Domain;
pub use error::{ConfigError, SetupError};
pub use types::{CommandOutcome, CommandSpec, StdioMode};
