//! EPUB build orchestration.
//!
//! A build is strictly sequential: load the layout, then download and render
//! each post in input order, then render the cover, then package. Any fatal
//! error aborts the whole build; a book with a missing chapter is worse than
//! no book at all. Chapter XHTML validation is the one soft check, logged and
//! otherwise ignored.

use super::{
    load_layout_template, template, Book, ChapterRecord, CoverRenderer, EpubInput,
    LayoutTemplate, MediaDownloader, Packager,
};
use crate::error::{Error, Result};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the finished book inside the working directory.
pub const OUTPUT_FILE: &str = "instagram-feed.epub";

/// Where a build takes its layout from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    Builtin,
    Directory(PathBuf),
}

impl LayoutSource {
    pub async fn load(&self) -> Result<LayoutTemplate> {
        match self {
            LayoutSource::Builtin => Ok(LayoutTemplate::builtin()),
            LayoutSource::Directory(dir) => load_layout_template(dir).await,
        }
    }
}

/// Puts downloaded media, rendered chapters and a cover together into a book.
pub struct EpubAssembler {
    layout: LayoutSource,
    downloader: Arc<dyn MediaDownloader>,
    cover: Arc<dyn CoverRenderer>,
    packager: Arc<dyn Packager>,
    validate: bool,
}

impl EpubAssembler {
    pub fn new(
        layout: LayoutSource,
        downloader: Arc<dyn MediaDownloader>,
        cover: Arc<dyn CoverRenderer>,
        packager: Arc<dyn Packager>,
    ) -> Self {
        Self {
            layout,
            downloader,
            cover,
            packager,
            validate: true,
        }
    }

    /// Whether to check each chapter for well-formed XHTML (on by default).
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Build `input` into `<output_dir>/instagram-feed.epub`.
    ///
    /// Returns the absolute path of the book. The file may exist even when
    /// this fails; only a returned path means the book is complete.
    pub async fn build(
        &self,
        input: &EpubInput,
        output_dir: &Path,
        progress: &ProgressBar,
    ) -> Result<PathBuf> {
        log::info!(
            "building EPUB from {} item(s) in {}",
            input.items.len(),
            output_dir.display()
        );
        let layout = self.layout.load().await?;

        progress.set_length(input.items.len() as u64);
        progress.set_message("Downloading posts...");
        let mut chapters = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let image_path = self.downloader.download(item, output_dir).await?;
            let image_ref = image_ref(&image_path, &item.id);
            let html_body = template::render(&layout, item, &image_ref);
            if self.validate {
                if let Err(e) = template::validate_xhtml(&html_body) {
                    log::warn!("chapter for post {} is not valid XHTML: {e}", item.id);
                }
            }
            chapters.push(ChapterRecord {
                title: template::chapter_title(item.caption.as_deref()),
                html_body,
                filename: format!("{}.xhtml", item.id),
                image_path,
                image_ref,
            });
            progress.inc(1);
        }
        log::info!("media download completed: {} chapter(s)", chapters.len());

        progress.set_message("Rendering cover...");
        let cover_image = self
            .cover
            .render_cover(&input.metadata, output_dir)
            .await?;
        log::info!("cover generated at {}", cover_image.display());

        let output_path = std::path::absolute(output_dir.join(OUTPUT_FILE))
            .map_err(Error::io(output_dir))?;
        progress.set_message("Packaging EPUB...");
        self.packager
            .package(
                Book {
                    metadata: input.metadata.clone(),
                    stylesheet: layout.css_text,
                    cover_image,
                    chapters,
                },
                &output_path,
            )
            .await?;

        log::info!("EPUB rendered to {}", output_path.display());
        Ok(output_path)
    }
}

fn image_ref(image_path: &Path, id: &str) -> String {
    let file_name = image_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("{id}.jpg"));
    format!("images/{file_name}")
}
