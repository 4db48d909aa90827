//! EPUB container packaging.
//!
//! Uses the `epub-builder` crate, which handles the packaging requirements
//! (OPF manifest, NCX/nav navigation, ZIP structure with the proper MIME
//! type). Each post is its own XHTML document with its image stored next to
//! it under `images/`.

use super::Book;
use crate::error::{Error, Result};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use epub_builder::{EpubBuilder, EpubContent, EpubVersion, ReferenceType, ZipLibrary};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Writes a finished [`Book`] to disk.
#[async_trait]
pub trait Packager: Send + Sync {
    async fn package(&self, book: Book, output_path: &Path) -> Result<()>;
}

/// Packages books with `epub-builder`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubPackager;

#[async_trait]
impl Packager for EpubPackager {
    async fn package(&self, book: Book, output_path: &Path) -> Result<()> {
        let output_path = output_path.to_path_buf();
        tokio::task::spawn_blocking(move || write_epub(&book, &output_path))
            .await
            .map_err(|e| Error::Package(anyhow!(e)))?
            .map_err(Error::Package)
    }
}

fn write_epub(book: &Book, output_path: &Path) -> anyhow::Result<()> {
    let metadata = &book.metadata;

    let mut builder =
        EpubBuilder::new(ZipLibrary::new().map_err(epub_err)?).map_err(epub_err)?;
    builder.epub_version(EpubVersion::V30);

    builder
        .metadata("title", &metadata.title)
        .map_err(epub_err)?;
    if !metadata.author.is_empty() {
        builder
            .metadata("author", &metadata.author)
            .map_err(epub_err)?;
    }
    // epub-builder has no publisher field
    if !metadata.contact.is_empty() {
        builder
            .metadata("description", &metadata.contact)
            .map_err(epub_err)?;
    }
    builder
        .metadata("lang", metadata.language())
        .map_err(epub_err)?;
    builder
        .metadata("generator", "insta-book")
        .map_err(epub_err)?;

    builder
        .stylesheet(book.stylesheet.as_bytes())
        .map_err(epub_err)?;

    // cover image plus a page showing it
    let cover = std::fs::read(&book.cover_image).with_context(|| {
        format!(
            "Failed to read cover image: {}",
            book.cover_image.display()
        )
    })?;
    builder
        .add_cover_image("cover.jpg", cover.as_slice(), "image/jpeg")
        .map_err(epub_err)?;
    builder
        .add_content(
            EpubContent::new("cover.xhtml", cover_page(&metadata.title).as_bytes())
                .title("Cover")
                .reftype(ReferenceType::Cover),
        )
        .map_err(epub_err)?;

    for chapter in &book.chapters {
        let image = std::fs::read(&chapter.image_path).with_context(|| {
            format!("Failed to read image: {}", chapter.image_path.display())
        })?;
        builder
            .add_resource(&chapter.image_ref, image.as_slice(), "image/jpeg")
            .map_err(epub_err)?;
        builder
            .add_content(
                EpubContent::new(&chapter.filename, chapter.html_body.as_bytes())
                    .title(&chapter.title)
                    .reftype(ReferenceType::Text),
            )
            .map_err(epub_err)?;
    }

    let output_file = File::create(output_path)
        .with_context(|| format!("Failed to create EPUB file: {}", output_path.display()))?;
    builder
        .generate(BufWriter::new(output_file))
        .map_err(epub_err)?;

    log::debug!(
        "packaged {} chapter(s) into {}",
        book.chapters.len(),
        output_path.display()
    );
    Ok(())
}

/// epub-builder reports through `eyre`, which anyhow can't wrap as a source.
fn epub_err(e: eyre::Report) -> anyhow::Error {
    anyhow!("{e:#}")
}

fn cover_page(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
    <meta http-equiv="Content-Type" content="text/html; charset=UTF-8"/>
    <title>{title}</title>
    <link rel="stylesheet" type="text/css" href="stylesheet.css"/>
</head>
<body>
<div class="cover">
<img src="cover.jpg" alt="{title}"/>
</div>
</body>
</html>"#,
        title = html_escape::encode_quoted_attribute(title),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::epub::{validate_xhtml, ChapterRecord, EpubMetadata};

    fn book(dir: &Path, chapters: usize) -> Book {
        let cover_image = dir.join("cover.jpg");
        std::fs::write(&cover_image, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        let chapters = (0..chapters)
            .map(|i| {
                let image_path = dir.join(format!("{i}.jpg"));
                std::fs::write(&image_path, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
                ChapterRecord {
                    title: format!("Post {i}"),
                    html_body: format!(
                        r#"<?xml version="1.0" encoding="UTF-8"?><html xmlns="http://www.w3.org/1999/xhtml"><head><title>Post {i}</title></head><body><img src="images/{i}.jpg" alt=""/></body></html>"#
                    ),
                    filename: format!("{i}.xhtml"),
                    image_path,
                    image_ref: format!("images/{i}.jpg"),
                }
            })
            .collect();
        Book {
            metadata: EpubMetadata {
                title: "Test EPUB".to_string(),
                author: "Test Author".to_string(),
                contact: "test@example.com".to_string(),
                instagram_url: "https://instagram.com/testuser".to_string(),
                language: None,
            },
            stylesheet: "body { margin: 0; }".to_string(),
            cover_image,
            chapters,
        }
    }

    #[tokio::test]
    async fn writes_a_zip_container() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.epub");

        EpubPackager
            .package(book(dir.path(), 3), &output)
            .await
            .expect("can package book");

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        for entry in [
            "OEBPS/0.xhtml",
            "OEBPS/images/2.jpg",
            "OEBPS/cover.jpg",
            "OEBPS/stylesheet.css",
        ] {
            assert!(contains(&bytes, entry.as_bytes()), "missing {entry}");
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn engine_errors_keep_their_message() {
        let err = Error::Package(epub_err(eyre::eyre!("zip writer failed")));
        assert_eq!(err.to_string(), "zip writer failed");
    }

    #[tokio::test]
    async fn packages_books_without_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.epub");

        EpubPackager
            .package(book(dir.path(), 0), &output)
            .await
            .expect("can package an empty book");
        assert!(output.exists());
    }

    #[tokio::test]
    async fn missing_cover_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = book(dir.path(), 1);
        book.cover_image = dir.path().join("nope.jpg");

        let err = EpubPackager
            .package(book, &dir.path().join("out.epub"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Package(_)));
        assert!(err.to_string().starts_with("Failed to read cover image"));
    }

    #[test]
    fn cover_page_is_well_formed() {
        assert_eq!(validate_xhtml(&cover_page("Me & \"you\"")), Ok(()));
    }
}
