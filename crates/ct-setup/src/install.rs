//! Ensure the editing server and tunnel agent are installed
//!
//! Each binary is probed with `--version`. When the probe fails the binary is
//! installed: code-server through its vendor install script, cloudflared by
//! downloading the release artifact for the host.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use ct_core::platform::{AgentArtifact, Arch, ArtifactKind, Os};
use ct_core::traits::{CommandRunner, Fetcher};
use ct_core::{CommandSpec, SetupError, Settings};

use crate::output::{print_info, print_success};

/// Name of the binary inside the macOS release archive
const AGENT_BINARY_NAME: &str = "cloudflared";

/// Result of ensuring the editing server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorStatus {
    AlreadyInstalled,
    Installed,
}

/// Which tunnel agent binary the rest of the run invokes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentBinary {
    /// Found on PATH
    System(String),
    /// Downloaded by this run
    Local(PathBuf),
}

impl AgentBinary {
    /// Program string for spawning the agent
    pub fn program(&self) -> String {
        match self {
            AgentBinary::System(name) => name.clone(),
            AgentBinary::Local(path) => path.to_string_lossy().into_owned(),
        }
    }

    /// Start a command line for the agent
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(self.program())
    }
}

/// Check whether `program --version` runs successfully
pub async fn probe(runner: &dyn CommandRunner, program: &str) -> bool {
    let spec = CommandSpec::new(program).arg("--version").quiet();
    match runner.run(&spec).await {
        Ok(outcome) => outcome.success(),
        Err(e) => {
            tracing::debug!("Probe of {} failed: {}", program, e);
            false
        }
    }
}

/// Make sure code-server is runnable, installing it if needed
pub async fn ensure_editor(
    settings: &Settings,
    runner: &dyn CommandRunner,
) -> Result<EditorStatus, SetupError> {
    let editor = &settings.config().editor;

    if probe(runner, &editor.binary).await {
        print_success("code-server is ready.");
        return Ok(EditorStatus::AlreadyInstalled);
    }

    print_info("Installing code-server...");
    let script = format!("curl -fsSL {} | sh", editor.install_script_url);
    let spec = CommandSpec::new("sh").args(["-c", script.as_str()]).inherit();

    let outcome = runner
        .run(&spec)
        .await
        .map_err(|e| SetupError::EditorInstall(e.to_string()))?;

    if !outcome.success() {
        return Err(SetupError::EditorInstall(outcome.describe_failure()));
    }

    tracing::info!("code-server installed via {}", editor.install_script_url);
    Ok(EditorStatus::Installed)
}

/// Make sure cloudflared is runnable, downloading it if needed
pub async fn ensure_agent(
    settings: &Settings,
    runner: &dyn CommandRunner,
    fetcher: &dyn Fetcher,
    os: &Os,
    arch: Arch,
) -> Result<AgentBinary, SetupError> {
    let agent = &settings.config().agent;

    if probe(runner, &agent.binary).await {
        print_success("cloudflared is ready.");
        return Ok(AgentBinary::System(agent.binary.clone()));
    }

    print_info("Installing cloudflared...");
    let artifact = AgentArtifact::for_host(os, arch, &agent.release_base_url);
    tracing::info!("Selected {:?} artifact {}", artifact.kind, artifact.url);

    let body = fetcher.fetch(&artifact.url).await?;

    fs::create_dir_all(&agent.install_dir)?;
    let binary_path = agent.install_dir.join(AGENT_BINARY_NAME);

    let binary = match artifact.kind {
        ArtifactKind::TarGz => extract_tar_gz_binary(&body, AGENT_BINARY_NAME)?,
        ArtifactKind::RawBinary => body,
    };
    fs::write(&binary_path, binary)?;
    make_executable(&binary_path)?;

    print_success(&format!("cloudflared downloaded to {}", binary_path.display()));
    Ok(AgentBinary::Local(binary_path))
}

/// Pull the entry named `name` out of a gzipped tarball
fn extract_tar_gz_binary(archive_content: &[u8], name: &str) -> Result<Vec<u8>, SetupError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(Cursor::new(archive_content)));

    let entries = archive
        .entries()
        .map_err(|e| SetupError::AgentInstall(format!("Failed to read tar entries: {}", e)))?;

    for entry in entries {
        let mut entry = entry
            .map_err(|e| SetupError::AgentInstall(format!("Failed to read tar entry: {}", e)))?;
        let path = entry
            .path()
            .map_err(|e| SetupError::AgentInstall(format!("Failed to get entry path: {}", e)))?;

        if path.file_name().and_then(|n| n.to_str()) == Some(name) {
            let mut content = Vec::new();
            entry.read_to_end(&mut content).map_err(|e| {
                SetupError::AgentInstall(format!("Failed to read binary from archive: {}", e))
            })?;
            return Ok(content);
        }
    }

    Err(SetupError::AgentInstall(format!(
        "'{}' not found in release archive",
        name
    )))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), SetupError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), SetupError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{settings_in, FakeFetcher, FakeRunner};
    use tempfile::TempDir;

    const BASE: &str = "https://github.com/cloudflare/cloudflared/releases/latest/download";

    fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[tokio::test]
    async fn test_editor_present_skips_install() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new();

        let status = ensure_editor(&settings, &runner).await.unwrap();

        assert_eq!(status, EditorStatus::AlreadyInstalled);
        assert_eq!(runner.calls(), vec!["code-server --version"]);
    }

    #[tokio::test]
    async fn test_editor_missing_runs_install_script() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new().missing("code-server");

        let status = ensure_editor(&settings, &runner).await.unwrap();

        assert_eq!(status, EditorStatus::Installed);
        let specs = runner.call_specs();
        assert_eq!(specs[1].program, "sh");
        assert_eq!(
            specs[1].args,
            vec!["-c", "curl -fsSL https://code-server.dev/install.sh | sh"]
        );
        assert_eq!(specs[1].stdio, ct_core::StdioMode::Inherit);
    }

    #[tokio::test]
    async fn test_editor_install_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new()
            .fail("code-server --version", 127, "")
            .fail("sh -c", 1, "curl: (6) Could not resolve host");

        let err = ensure_editor(&settings, &runner).await.unwrap_err();
        assert!(matches!(err, SetupError::EditorInstall(msg) if msg.contains("resolve host")));
    }

    #[tokio::test]
    async fn test_agent_on_path_is_used() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new();
        let fetcher = FakeFetcher::new();

        let binary = ensure_agent(&settings, &runner, &fetcher, &Os::Linux, Arch::Amd64)
            .await
            .unwrap();

        assert_eq!(binary, AgentBinary::System("cloudflared".into()));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_agent_linux_downloads_raw_binary() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new().missing("cloudflared");
        let url = format!("{}/cloudflared-linux-amd64", BASE);
        let fetcher = FakeFetcher::new().with(&url, b"#!/bin/sh\n".to_vec());

        let binary = ensure_agent(&settings, &runner, &fetcher, &Os::Linux, Arch::Amd64)
            .await
            .unwrap();

        let expected = dir.path().join("bin").join("cloudflared");
        assert_eq!(binary, AgentBinary::Local(expected.clone()));
        assert_eq!(fetcher.requests(), vec![url]);
        assert_eq!(fs::read(&expected).unwrap(), b"#!/bin/sh\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&expected).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_agent_macos_extracts_archive() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new().fail("cloudflared --version", 1, "");
        let url = format!("{}/cloudflared-darwin-arm64.tgz", BASE);
        let archive = tar_gz(&[("README", b"docs"), ("cloudflared", b"mach-o")]);
        let fetcher = FakeFetcher::new().with(&url, archive);

        let binary = ensure_agent(&settings, &runner, &fetcher, &Os::MacOs, Arch::Arm64)
            .await
            .unwrap();

        let expected = dir.path().join("bin").join("cloudflared");
        assert_eq!(binary.program(), expected.to_string_lossy());
        assert_eq!(fs::read(&expected).unwrap(), b"mach-o");
    }

    #[tokio::test]
    async fn test_agent_archive_without_binary_fails() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(dir.path());
        let runner = FakeRunner::new().missing("cloudflared");
        let url = format!("{}/cloudflared-darwin-amd64.tgz", BASE);
        let fetcher = FakeFetcher::new().with(&url, tar_gz(&[("other", b"x")]));

        let err = ensure_agent(&settings, &runner, &fetcher, &Os::MacOs, Arch::Amd64)
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::AgentInstall(_)));
    }
}
