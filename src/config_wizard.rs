//! Interactive configuration wizard for creating `insta-book.toml`.
//!
//! The wizard collects book metadata, feed filter settings and layout options
//! through a series of prompts. When a custom layout directory is chosen and
//! it doesn't have layout files yet, the built-in layout is written there as a
//! starting point.

use crate::config::{default_epub_name, Configuration, LayoutConfig, OutputConfig};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, FuzzySelect, Input};
use insta_book::epub::{
    EpubMetadata, LayoutTemplate, DEFAULT_LANGUAGE, LAYOUT_CSS_FILE, LAYOUT_HTML_FILE,
};
use insta_book::instagram::FeedFilter;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

const LANGUAGES: &[&str] = &[DEFAULT_LANGUAGE, "en", "de", "fr", "es", "ko", "zh"];

/// Run the interactive configuration wizard and write `config_path`.
pub fn run(config_path: &Path) -> Result<()> {
    let theme = ColorfulTheme {
        ..ColorfulTheme::default()
    };

    let defaults = EpubMetadata::default();
    let title = Input::with_theme(&theme)
        .with_prompt("Book title")
        .default(defaults.title)
        .interact()
        .with_context(|| "Failed to obtain title")?;
    let author = Input::with_theme(&theme)
        .with_prompt("Author")
        .allow_empty(true)
        .interact()
        .with_context(|| "Failed to obtain author")?;
    let contact = Input::with_theme(&theme)
        .with_prompt("Contact (e-mail or website)")
        .allow_empty(true)
        .interact()
        .with_context(|| "Failed to obtain contact")?;
    let instagram_url = Input::with_theme(&theme)
        .with_prompt("Instagram profile URL")
        .allow_empty(true)
        .interact()
        .with_context(|| "Failed to obtain Instagram URL")?;
    let language = FuzzySelect::with_theme(&theme)
        .with_prompt("Book language")
        .items(LANGUAGES)
        .default(0)
        .interact()?;
    let language = LANGUAGES[language];

    let metadata = EpubMetadata {
        title,
        author,
        contact,
        instagram_url,
        language: (language != DEFAULT_LANGUAGE).then(|| language.to_string()),
    };

    let hashtag: String = Input::with_theme(&theme)
        .with_prompt("Only include posts with this hashtag (leave empty for all)")
        .allow_empty(true)
        .interact()?;
    let start_date = prompt_date(&theme, "First day to include (YYYY-MM-DD, empty for none)")?;
    let end_date = prompt_date(&theme, "Last day to include (YYYY-MM-DD, empty for none)")?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(anyhow!("{start} is after {end}, no posts would match!"));
        }
    }
    let max_count: NonZeroUsize = Input::with_theme(&theme)
        .with_prompt("Maximum number of posts")
        .default(FeedFilter::default().max_count)
        .interact()?;

    let filter = FeedFilter {
        hashtag: Some(hashtag.trim().to_string()).filter(|tag| !tag.is_empty()),
        start_date,
        end_date,
        max_count,
    };

    let mut layout = LayoutConfig::default();
    if Confirm::with_theme(&theme)
        .with_prompt("Do you want to customize the chapter layout?")
        .default(false)
        .interact()?
    {
        let dir: String = Input::with_theme(&theme)
            .with_prompt("Layout directory")
            .default("book_layout".to_string())
            .interact()?;
        let dir = PathBuf::from(dir);
        write_default_layout(&dir)?;
        layout.directory = Some(dir);
    }

    let outfile: String = Input::with_theme(&theme)
        .with_prompt("Output epub file")
        .default(default_epub_name(&filter).display().to_string())
        .interact()?;
    let mut outfile = PathBuf::from(outfile);
    let ext = outfile
        .extension()
        .map(std::ffi::OsStr::to_ascii_lowercase)
        .unwrap_or_default();
    if ext != *"epub" {
        outfile.set_extension("epub");
    }

    let config = Configuration {
        metadata,
        filter,
        layout,
        output: OutputConfig {
            outfile: Some(outfile),
            ..OutputConfig::default()
        },
        ..Configuration::default()
    };

    let config =
        toml::to_string_pretty(&config).with_context(|| "Failed to convert configuration to TOML")?;

    if config_path.exists()
        && !Confirm::with_theme(&theme)
            .with_prompt(format!(
                "{} already exists, do you want to override it?",
                config_path.display()
            ))
            .interact()?
    {
        println!("Configuration:");
        println!("{}", config);
    } else {
        std::fs::write(config_path, config)
            .with_context(|| "Failed to write configuration file")?;
        println!("{} written!", config_path.display());
    }

    Ok(())
}

fn prompt_date(theme: &ColorfulTheme, prompt: &str) -> Result<Option<NaiveDate>> {
    let date: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .validate_with(|input: &String| parse_date(input).map(|_| ()))
        .interact()?;
    Ok(parse_date(&date).ok().flatten())
}

fn parse_date(input: &str) -> Result<Option<NaiveDate>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| format!("Not a YYYY-MM-DD date: {e}"))
}

/// Write the built-in layout into `dir`, leaving existing files alone.
fn write_default_layout(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let builtin = LayoutTemplate::builtin();
    for (name, contents) in [
        (LAYOUT_HTML_FILE, builtin.body_html),
        (LAYOUT_CSS_FILE, builtin.css_text),
    ] {
        let path = dir.join(name);
        if path.exists() {
            println!("{} already exists, keeping it", path.display());
            continue;
        }
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} written!", path.display());
    }
    Ok(())
}
