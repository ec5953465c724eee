//! ct-cli: Command-line interface for code-tunnel
//!
//! Provides the `code-tunnel` binary that runs the setup flow and reports
//! on the local installation.

pub mod commands;
pub mod output;
