//! Host detection and tunnel agent release artifacts

use std::fmt;

/// Host operating system, as far as the install path cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Os {
    MacOs,
    Linux,
    Other(String),
}

impl Os {
    /// Detect the running host
    pub fn current() -> Self {
        Self::from_name(std::env::consts::OS)
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "macos" | "darwin" => Os::MacOs,
            "linux" => Os::Linux,
            other => Os::Other(other.to_string()),
        }
    }
}

/// CPU architecture in cloudflared release naming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    /// Detect the running host
    pub fn current() -> Self {
        Self::from_name(std::env::consts::ARCH)
    }

    /// Unknown architectures fall back to amd64
    pub fn from_name(name: &str) -> Self {
        match name {
            "aarch64" | "arm64" => Arch::Arm64,
            _ => Arch::Amd64,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a downloaded artifact turns into a runnable binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Gzipped tarball holding a single `cloudflared` entry
    TarGz,
    /// The binary itself
    RawBinary,
}

/// Release artifact to fetch for a given host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentArtifact {
    pub url: String,
    pub kind: ArtifactKind,
}

impl AgentArtifact {
    /// Select the artifact matching `os`/`arch`
    pub fn for_host(os: &Os, arch: Arch, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        match os {
            Os::MacOs => Self {
                url: format!("{}/cloudflared-darwin-{}.tgz", base, arch),
                kind: ArtifactKind::TarGz,
            },
            Os::Linux | Os::Other(_) => Self {
                url: format!("{}/cloudflared-linux-{}", base, arch),
                kind: ArtifactKind::RawBinary,
            },
        }
    }
}
