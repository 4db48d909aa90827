use crate::instagram::MediaItem;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_LANGUAGE: &str = "ja";

/// Book metadata supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpubMetadata {
    pub title: String,
    pub author: String,
    /// Stored in the book's description metadata.
    pub contact: String,
    pub instagram_url: String,
    /// BCP 47 language code; defaults to [`DEFAULT_LANGUAGE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Default for EpubMetadata {
    fn default() -> Self {
        Self {
            title: "Instagram Feed".to_string(),
            author: String::new(),
            contact: String::new(),
            instagram_url: String::new(),
            language: None,
        }
    }
}

impl EpubMetadata {
    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .filter(|lang| !lang.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// Everything one build needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpubInput {
    pub metadata: EpubMetadata,
    pub items: Vec<MediaItem>,
}

/// One rendered post, ready to be packaged.
#[derive(Debug, Clone)]
pub struct ChapterRecord {
    pub title: String,
    pub html_body: String,
    /// `<id>.xhtml`
    pub filename: String,
    /// Where the downloaded image lives on disk.
    pub image_path: PathBuf,
    /// Where the chapter expects the image inside the book.
    pub image_ref: String,
}

/// The finished pieces handed to a [`Packager`](super::Packager).
#[derive(Debug, Clone)]
pub struct Book {
    pub metadata: EpubMetadata,
    pub stylesheet: String,
    pub cover_image: PathBuf,
    pub chapters: Vec<ChapterRecord>,
}
