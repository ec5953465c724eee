//! HTTP artifact downloads

use async_trait::async_trait;

use crate::error::SetupError;
use crate::traits::Fetcher;

/// Fetches artifacts over HTTPS with reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SetupError> {
        let download_error = |source| SetupError::Download {
            url: url.to_string(),
            source,
        };

        tracing::info!("Downloading {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(download_error)?;

        let bytes = response.bytes().await.map_err(download_error)?;
        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
