use crate::error::{Error, Result};
use crate::instagram::MediaItem;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Fetches the image behind a post into a working directory.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, item: &MediaItem, output_dir: &Path) -> Result<PathBuf>;
}

/// `<output_dir>/<id>.jpg`, whatever the actual image format is.
pub fn media_path(item: &MediaItem, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}.jpg", item.id))
}

/// Downloads media over HTTP with a single attempt per item.
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaDownloader for HttpDownloader {
    async fn download(&self, item: &MediaItem, output_dir: &Path) -> Result<PathBuf> {
        log::debug!("downloading media for post {}", item.id);
        let response = self.client.get(&item.media_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::MediaFetch {
                status,
                url: item.media_url.clone(),
            });
        }
        let bytes = response.bytes().await?;

        let path = media_path(item, output_dir);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(Error::io(&path))?;
        log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}
