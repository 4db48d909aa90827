//! Cover image rendering.
//!
//! The cover is a styled HTML card with the book's title, author and profile
//! link, rasterized to a JPEG by headless Chrome. The card is rendered by a
//! browser rather than parsed as XML, so the plain four-entity HTML escape is
//! enough here.

use super::EpubMetadata;
use crate::error::{Error, Result};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use std::path::{Path, PathBuf};

pub const COVER_WIDTH: u32 = 1200;
pub const COVER_HEIGHT: u32 = 1600;
pub const COVER_QUALITY: u32 = 90;
pub const COVER_FILE: &str = "cover.jpg";
const COVER_HTML_FILE: &str = "cover.html";

/// Produces `<output_dir>/cover.jpg` for a book.
#[async_trait]
pub trait CoverRenderer: Send + Sync {
    async fn render_cover(&self, metadata: &EpubMetadata, output_dir: &Path) -> Result<PathBuf>;
}

/// Renders covers with a locally installed Chrome/Chromium.
#[derive(Debug, Clone, Default)]
pub struct ChromeCoverRenderer {
    /// Explicit browser binary; otherwise headless_chrome looks one up.
    pub chrome_path: Option<PathBuf>,
}

#[async_trait]
impl CoverRenderer for ChromeCoverRenderer {
    async fn render_cover(&self, metadata: &EpubMetadata, output_dir: &Path) -> Result<PathBuf> {
        let html_path = std::path::absolute(output_dir.join(COVER_HTML_FILE))
            .map_err(Error::io(output_dir))?;
        tokio::fs::write(&html_path, build_cover_html(metadata))
            .await
            .map_err(Error::io(&html_path))?;

        let page_url = format!("file://{}", html_path.display());
        let chrome_path = self.chrome_path.clone();
        let captured = tokio::task::spawn_blocking(move || capture(&page_url, chrome_path))
            .await
            .map_err(|e| Error::Cover(anyhow!(e)));
        // only cover.jpg stays in the work dir
        if let Err(e) = tokio::fs::remove_file(&html_path).await {
            log::warn!("could not remove {}: {e}", html_path.display());
        }
        let jpeg = captured?.map_err(Error::Cover)?;

        let cover_path = output_dir.join(COVER_FILE);
        tokio::fs::write(&cover_path, &jpeg)
            .await
            .map_err(Error::io(&cover_path))?;
        log::debug!("cover written to {}", cover_path.display());
        Ok(cover_path)
    }
}

fn capture(page_url: &str, chrome_path: Option<PathBuf>) -> anyhow::Result<Vec<u8>> {
    let browser = Browser::new(LaunchOptions {
        headless: true,
        window_size: Some((COVER_WIDTH, COVER_HEIGHT)),
        path: chrome_path,
        ..LaunchOptions::default()
    })
    .context("Failed to launch headless Chrome")?;
    let tab = browser.new_tab()?;
    tab.navigate_to(page_url)?.wait_until_navigated()?;

    let clip = Page::Viewport {
        x: 0.0,
        y: 0.0,
        width: f64::from(COVER_WIDTH),
        height: f64::from(COVER_HEIGHT),
        scale: 1.0,
    };
    tab.capture_screenshot(
        Page::CaptureScreenshotFormatOption::Jpeg,
        Some(COVER_QUALITY),
        Some(clip),
        true,
    )
}

/// Escape `& < > "` for HTML text.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// The self-contained HTML card the cover image is rendered from.
pub fn build_cover_html(metadata: &EpubMetadata) -> String {
    let title = if metadata.title.is_empty() {
        "Instagram Feed"
    } else {
        &metadata.title
    };

    format!(
        r#"<!doctype html>
<html lang="{lang}">
<head>
    <meta charset="utf-8" />
    <style>
        body {{
            margin: 0;
            font-family: "Inter", "Helvetica", "Arial", sans-serif;
            background: #0f172a;
            color: #f8fafc;
            display: flex;
            align-items: center;
            justify-content: center;
            width: {width}px;
            height: {height}px;
        }}
        .card {{
            background: linear-gradient(160deg, #1e3a8a, #0f172a);
            border-radius: 24px;
            padding: 80px;
            width: 920px;
            box-shadow: 0 40px 80px rgba(15, 23, 42, 0.4);
        }}
        h1 {{
            margin: 0 0 24px;
            font-size: 56px;
            line-height: 1.1;
        }}
        .meta {{
            font-size: 22px;
            color: #cbd5f5;
        }}
    </style>
</head>
<body>
    <div class="card">
        <h1>{title}</h1>
        <p class="meta">{author}</p>
        <p class="meta">{instagram_url}</p>
    </div>
</body>
</html>"#,
        lang = escape_html(metadata.language()),
        width = COVER_WIDTH,
        height = COVER_HEIGHT,
        title = escape_html(title),
        author = escape_html(&metadata.author),
        instagram_url = escape_html(&metadata.instagram_url),
    )
}
