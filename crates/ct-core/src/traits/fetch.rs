//! Artifact download trait

use async_trait::async_trait;

use crate::error::SetupError;

/// Downloads release artifacts
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full body at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SetupError>;
}
