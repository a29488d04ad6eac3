use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CoverArtError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("No cover art available (status {0})")]
    NotFound(u16),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads the front cover of a release to a local file
#[async_trait]
pub trait CoverArtFetcher: Send + Sync {
    async fn fetch_front(&self, release_id: &str, dest: &Path) -> Result<(), CoverArtError>;
}

/// Cover Art Archive client
#[derive(Clone)]
pub struct CoverArtArchive {
    client: Client,
    base_url: String,
}

impl CoverArtArchive {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn front_url(&self, release_id: &str) -> String {
        format!(
            "{}/{}/front",
            self.base_url,
            urlencoding::encode(release_id)
        )
    }
}

#[async_trait]
impl CoverArtFetcher for CoverArtArchive {
    async fn fetch_front(&self, release_id: &str, dest: &Path) -> Result<(), CoverArtError> {
        let url = self.front_url(release_id);
        debug!("Fetching cover art from Cover Art Archive: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(CoverArtError::NotFound(status.as_u16()));
        }

        // Only touch the file once the whole image is in memory
        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;

        info!(
            "Downloaded cover art ({} bytes) to {}",
            bytes.len(),
            dest.display()
        );
        Ok(())
    }
}
