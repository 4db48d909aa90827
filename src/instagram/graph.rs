use super::MediaItem;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

pub const GRAPH_API_URL: &str = "https://graph.instagram.com";

const MEDIA_FIELDS: &str = "id,caption,media_url,permalink,timestamp";

/// Somewhere to list a user's media from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn list_media(&self, access_token: &str) -> Result<Vec<MediaItem>>;
}

#[derive(Deserialize)]
struct MediaPage {
    #[serde(default)]
    data: Option<Vec<MediaItem>>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Deserialize)]
struct Paging {
    next: Option<String>,
}

/// Instagram Graph API client for the `me/media` edge.
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    max_pages: usize,
}

impl GraphClient {
    pub fn new<S: Into<String>>(client: reqwest::Client, base_url: S) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_pages: 1,
        }
    }

    /// Follow `paging.next` links for up to `max_pages` pages in total.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Request URLs carry the access token, so they are stripped from any
    /// transport error before it leaves this client.
    async fn fetch_page(&self, request: reqwest::RequestBuilder) -> Result<MediaPage> {
        let response = request.send().await.map_err(without_url)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Graph API request failed with {status}: {body}");
            return Err(Error::GraphApi { status });
        }
        response.json::<MediaPage>().await.map_err(without_url)
    }
}

fn without_url(e: reqwest::Error) -> Error {
    Error::Http(e.without_url())
}

#[async_trait]
impl MediaSource for GraphClient {
    async fn list_media(&self, access_token: &str) -> Result<Vec<MediaItem>> {
        if access_token.is_empty() {
            return Err(Error::MissingAccessToken);
        }

        let url = format!("{}/me/media", self.base_url);
        log::debug!(
            "Graph API request to {url}?fields={MEDIA_FIELDS} (token length {})",
            access_token.len()
        );
        let request = self
            .client
            .get(&url)
            .query(&[("fields", MEDIA_FIELDS), ("access_token", access_token)]);

        let mut page = self.fetch_page(request).await?;
        let mut items = page.data.take().unwrap_or_default();
        let mut pages = 1;
        while pages < self.max_pages {
            let Some(next) = page.paging.as_ref().and_then(|p| p.next.clone()) else {
                break;
            };
            page = self.fetch_page(self.client.get(next)).await?;
            items.extend(page.data.take().unwrap_or_default());
            pages += 1;
        }

        log::info!("Graph API returned {} item(s) over {pages} page(s)", items.len());
        Ok(items)
    }
}
