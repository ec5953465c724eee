//! ct-setup: Provisioning flow for code-tunnel
//!
//! Installs code-server and cloudflared, authenticates the agent, provisions
//! the named tunnel and DNS route, then runs both processes until
//! interrupted.

pub mod auth;
pub mod ingress;
pub mod install;
pub mod orchestrator;
pub mod output;
pub mod prompt;
pub mod provision;
pub mod services;

#[cfg(test)]
mod testing;

pub use install::{probe, AgentBinary};
pub use orchestrator::{DomainSource, Orchestrator, SetupState};
pub use services::{install_signal_handler, Shutdown};
