//! The `insta-book.toml` configuration file.
//!
//! Every section has defaults, so an empty file (or a file with only
//! `[metadata]` filled in) is a valid configuration.

use anyhow::{Context, Result};
use insta_book::epub::{EpubMetadata, LayoutSource, OUTPUT_FILE};
use insta_book::instagram::{FeedFilter, GRAPH_API_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "insta-book.toml";

/// Complete configuration for an insta-book project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub auth: AuthConfig,
    pub graph: GraphConfig,
    pub filter: FeedFilter,
    pub metadata: EpubMetadata,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JSON file holding the signed-in user and their linked accounts.
    pub session_file: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_file: PathBuf::from("session.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub base_url: String,
    /// How many pages of `me/media` to walk.
    pub max_pages: usize,
    /// Per-request timeout, also used for media downloads.
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: GRAPH_API_URL.to_string(),
            max_pages: 1,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Directory with `layout.html` and `layout.css`; the built-in layout
    /// is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Check each chapter for well-formed XHTML and warn when it isn't.
    pub validate: bool,
    /// Headless Chrome binary for the cover; looked up when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            directory: None,
            validate: true,
            chrome_path: None,
        }
    }
}

impl LayoutConfig {
    pub fn source(&self) -> LayoutSource {
        match &self.directory {
            Some(dir) => LayoutSource::Directory(dir.clone()),
            None => LayoutSource::Builtin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output EPUB file; named after the hashtag when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outfile: Option<PathBuf>,
    /// Where `fetch` saves posts and `render --saved` reads them.
    pub posts_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            outfile: None,
            posts_file: PathBuf::from("posts.json"),
        }
    }
}

impl Configuration {
    pub fn load(path: &Path) -> Result<Configuration> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse TOML")
    }

    /// Like [`Configuration::load`], but a missing file means all defaults.
    pub fn load_or_default(path: &Path) -> Result<Configuration> {
        if path.exists() {
            Configuration::load(path)
        } else {
            log::debug!("{} not found, using defaults", path.display());
            Ok(Configuration::default())
        }
    }
}

/// The EPUB file name for a filter: `<hashtag>.epub`, or the generic name.
pub fn default_epub_name(filter: &FeedFilter) -> PathBuf {
    match filter.bare_hashtag() {
        Some(tag) => PathBuf::from(format!("{tag}.epub")),
        None => PathBuf::from(OUTPUT_FILE),
    }
}
