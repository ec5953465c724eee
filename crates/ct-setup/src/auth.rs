//! Tunnel agent authentication

use ct_core::traits::CommandRunner;
use ct_core::{SetupError, Settings};

use crate::install::AgentBinary;
use crate::output::{print_heading, print_success};

/// How authentication was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// `cert.pem` already present, login skipped
    CredentialsFound,
    /// Interactive login completed in this run
    LoggedIn,
}

/// Whether the login credential file exists
pub fn has_credentials(settings: &Settings) -> bool {
    settings.credential_file().exists()
}

/// Run `tunnel login` unless credentials are already on disk
///
/// The login blocks until the operator finishes the browser flow. There is
/// no timeout.
pub async fn ensure_authenticated(
    settings: &Settings,
    agent: &AgentBinary,
    runner: &dyn CommandRunner,
) -> Result<AuthStatus, SetupError> {
    if has_credentials(settings) {
        print_success("Cloudflare credentials found.");
        return Ok(AuthStatus::CredentialsFound);
    }

    print_heading("AUTHENTICATION REQUIRED");
    println!("   We will open a login link. Please authorize this machine.");
    println!("   (If running on a remote server, copy the URL to your local browser).");

    let spec = agent.command().args(["tunnel", "login"]).inherit();
    let outcome = runner
        .run(&spec)
        .await
        .map_err(|e| SetupError::LoginFailed(e.to_string()))?;

    if !outcome.success() {
        return Err(SetupError::LoginFailed(outcome.describe_failure()));
    }

    tracing::info!(
        "Login complete, credentials at {}",
        settings.credential_file().display()
    );
    Ok(AuthStatus::LoggedIn)
}
