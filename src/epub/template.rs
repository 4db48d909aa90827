//! Chapter rendering from the book layout.
//!
//! A layout is an XHTML skeleton with placeholders plus a stylesheet. Every
//! value that comes from a post is escaped before it is placed into the
//! skeleton, and only then are caption newlines turned into `<br />`, so the
//! break markup survives while the user's text can never open a tag. The
//! result must parse as strict XML: EPUB readers are far less forgiving than
//! browsers.

use crate::instagram::MediaItem;
use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

pub const LAYOUT_HTML_FILE: &str = "layout.html";
pub const LAYOUT_CSS_FILE: &str = "layout.css";

/// Chapter title used when a post has no caption.
pub const FALLBACK_TITLE: &str = "Instagram Post";
const TITLE_CHARS: usize = 32;

const CHAPTER_TITLE: &str = "chapter_title";
const IMAGE_FILENAME: &str = "image_filename";
const CAPTION_HTML: &str = "caption_html";
const POST_URL: &str = "post_url";
const CSS_CONTENT: &str = "css_content";

/// The markup skeleton and stylesheet shared by every chapter in a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTemplate {
    pub body_html: String,
    pub css_text: String,
}

impl LayoutTemplate {
    /// The layout shipped with insta-book.
    pub fn builtin() -> LayoutTemplate {
        LayoutTemplate {
            body_html: include_str!("../../layout/layout.html").to_string(),
            css_text: include_str!("../../layout/layout.css").to_string(),
        }
    }
}

/// Read `layout.html` and `layout.css` from `dir`.
pub async fn load_layout_template(dir: &Path) -> Result<LayoutTemplate> {
    let html_path = dir.join(LAYOUT_HTML_FILE);
    let css_path = dir.join(LAYOUT_CSS_FILE);

    let body_html = tokio::fs::read_to_string(&html_path)
        .await
        .map_err(|source| Error::LayoutRead {
            path: html_path.clone(),
            source,
        })?;
    let css_text = tokio::fs::read_to_string(&css_path)
        .await
        .map_err(|source| Error::LayoutRead {
            path: css_path.clone(),
            source,
        })?;

    let placeholder = format!("{{{CHAPTER_TITLE}}}");
    if !body_html.contains(&placeholder) {
        return Err(Error::InvalidLayout {
            path: html_path,
            placeholder: "{chapter_title}",
        });
    }

    log::debug!("loaded layout from {}", dir.display());
    Ok(LayoutTemplate {
        body_html,
        css_text,
    })
}

/// Raw, unescaped values for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFields<'a> {
    pub title: String,
    /// Path of the image as the chapter should reference it. Trusted.
    pub image_ref: &'a str,
    pub caption: &'a str,
    pub post_url: &'a str,
}

impl<'a> ChapterFields<'a> {
    pub fn from_item(item: &'a MediaItem, image_ref: &'a str) -> ChapterFields<'a> {
        ChapterFields {
            title: chapter_title(item.caption.as_deref()),
            image_ref,
            caption: item.caption_or_empty(),
            post_url: &item.permalink,
        }
    }
}

/// First 32 characters of the caption, or [`FALLBACK_TITLE`].
pub fn chapter_title(caption: Option<&str>) -> String {
    match caption {
        Some(caption) if !caption.is_empty() => caption.chars().take(TITLE_CHARS).collect(),
        _ => FALLBACK_TITLE.to_string(),
    }
}

/// Escape `& < > " '` so the text is safe in XML content and attributes.
pub fn escape_xml(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Escaped caption with newlines turned into `<br />`.
pub fn caption_html(caption: &str) -> String {
    escape_xml(caption)
        .replace("\r\n", "\n")
        .replace('\n', "<br />")
}

/// Render `item` into the layout, referencing its image as `image_ref`.
pub fn render(template: &LayoutTemplate, item: &MediaItem, image_ref: &str) -> String {
    render_chapter(template, &ChapterFields::from_item(item, image_ref))
}

pub fn render_chapter(template: &LayoutTemplate, fields: &ChapterFields<'_>) -> String {
    let title = escape_xml(&fields.title);
    let caption = caption_html(fields.caption);
    let post_url = escape_xml(fields.post_url);

    fill_placeholders(&template.body_html, |name| match name {
        CHAPTER_TITLE => Some(title.as_str()),
        IMAGE_FILENAME => Some(fields.image_ref),
        CAPTION_HTML => Some(caption.as_str()),
        POST_URL => Some(post_url.as_str()),
        CSS_CONTENT => Some(template.css_text.as_str()),
        _ => None,
    })
}

/// Single pass over the skeleton, so substituted values are never rescanned
/// for placeholders. Braces that don't name a placeholder (CSS blocks, say)
/// are copied through.
fn fill_placeholders<'v>(skeleton: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(skeleton.len() * 2);
    let mut rest = skeleton;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substitution = after
            .find('}')
            .and_then(|close| lookup(&after[..close]).map(|value| (close, value)));
        match substitution {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// A chapter that failed to parse as XML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed XHTML at byte {position}: {message}")]
pub struct MalformedXhtml {
    pub position: usize,
    pub message: String,
}

/// Check that `html` is well-formed XML: balanced tags, quoted attributes,
/// and only entities XML itself knows about.
pub fn validate_xhtml(html: &str) -> std::result::Result<(), MalformedXhtml> {
    let mut reader = Reader::from_str(html);
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                for attr in tag.attributes() {
                    let attr = attr.map_err(|e| malformed(&reader, e.to_string()))?;
                    attr.unescape_value()
                        .map_err(|e| malformed(&reader, e.to_string()))?;
                }
                depth += 1;
            }
            Ok(Event::Empty(tag)) => {
                for attr in tag.attributes() {
                    let attr = attr.map_err(|e| malformed(&reader, e.to_string()))?;
                    attr.unescape_value()
                        .map_err(|e| malformed(&reader, e.to_string()))?;
                }
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return Err(malformed(&reader, "unexpected closing tag".to_string()));
                }
                depth -= 1;
            }
            Ok(Event::Text(text)) => {
                text.unescape()
                    .map_err(|e| malformed(&reader, e.to_string()))?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(&reader, e.to_string())),
        }
    }

    if depth != 0 {
        return Err(MalformedXhtml {
            position: html.len(),
            message: format!("{depth} unclosed element(s)"),
        });
    }
    Ok(())
}

fn malformed(reader: &Reader<&[u8]>, message: String) -> MalformedXhtml {
    MalformedXhtml {
        position: reader.buffer_position(),
        message,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::instagram::MediaItemBuilder;

    fn item(caption: Option<&str>, permalink: &str) -> MediaItem {
        let mut builder = MediaItemBuilder::default();
        builder
            .id("17895695668004551")
            .media_url("https://example.com/image.jpg")
            .permalink(permalink)
            .timestamp("2025-01-16T14:00:00Z");
        if let Some(caption) = caption {
            builder.caption(caption);
        }
        builder.build().unwrap()
    }

    fn template(body_html: &str) -> LayoutTemplate {
        LayoutTemplate {
            body_html: body_html.to_string(),
            css_text: String::new(),
        }
    }

    const STRICT: &str = r#"<?xml version="1.0" encoding="utf-8"?><html xmlns="http://www.w3.org/1999/xhtml"><head><title>{chapter_title}</title></head><body><h1>{chapter_title}</h1><img src="{image_filename}" alt=""/><p>{caption_html}</p><a href="{post_url}">Link</a></body></html>"#;

    #[test]
    fn replaces_placeholders() {
        let html = render(
            &template("{chapter_title}-{image_filename}-{caption_html}-{post_url}"),
            &item(Some("Hello"), "p"),
            "file:///tmp/a.jpg",
        );
        assert_eq!(html, "Hello-file:///tmp/a.jpg-Hello-p");
    }

    #[test]
    fn escapes_special_characters() {
        let html = render(
            &template(STRICT),
            &item(
                Some(r#"Post with <html> & "quotes" in caption"#),
                "https://www.instagram.com/p/DEF456/?utm_source=test&ref=share",
            ),
            "images/1.jpg",
        );
        assert!(html.contains("&lt;html&gt;"));
        assert!(html.contains("&amp;"));
        assert!(html.contains("&quot;quotes&quot;"));
        assert!(html.contains("utm_source=test&amp;ref=share"));
        assert!(!html.contains("<html> &"));
    }

    #[test]
    fn escapes_apostrophes() {
        let caption = "it's <b>";
        let html = render(&template("<p>{caption_html}</p>"), &item(Some(caption), "p"), "i");
        let inner = html
            .strip_prefix("<p>")
            .and_then(|s| s.strip_suffix("</p>"))
            .unwrap();
        for raw in ['<', '>', '"', '\''] {
            assert!(!inner.contains(raw), "found raw {raw:?} in {inner}");
        }
    }

    #[test]
    fn missing_caption_uses_fallback_title() {
        let html = render(&template("<h1>{chapter_title}</h1>"), &item(None, "p"), "i");
        assert_eq!(html, "<h1>Instagram Post</h1>");
        assert_eq!(chapter_title(Some("")), FALLBACK_TITLE);
    }

    #[test]
    fn long_captions_are_truncated_in_the_title() {
        let caption = "This is a very long caption that exceeds 32 characters and should be truncated";
        let title = chapter_title(Some(caption));
        assert_eq!(title, "This is a very long caption that");
        assert_eq!(title.chars().count(), 32);

        let html = render(&template("{caption_html}"), &item(Some(caption), "p"), "i");
        assert_eq!(html, caption);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let caption = "🎉".repeat(40);
        assert_eq!(chapter_title(Some(&caption)), "🎉".repeat(32));
    }

    #[test]
    fn title_is_truncated_before_escaping() {
        let caption = format!("{}&rest", "a".repeat(31));
        let html = render(&template("{chapter_title}"), &item(Some(&caption), "p"), "i");
        assert_eq!(html, format!("{}&amp;", "a".repeat(31)));
    }

    #[test]
    fn newlines_become_unescaped_breaks() {
        let html = render(
            &template("<p>{caption_html}</p>"),
            &item(Some("Line 1\nLine 2\r\n\nLine 4 with emoji 🎉"), "p"),
            "i",
        );
        assert_eq!(
            html,
            "<p>Line 1<br />Line 2<br /><br />Line 4 with emoji 🎉</p>"
        );
        assert!(!html.contains("&lt;br /&gt;"));
        assert!(!html.contains('\n'));
    }

    #[test]
    fn image_reference_is_inserted_verbatim() {
        let html = render(&template("{image_filename}"), &item(None, "p"), "images/a&b.jpg");
        assert_eq!(html, "images/a&b.jpg");
    }

    #[test]
    fn placeholders_in_captions_are_not_expanded() {
        let html = render(
            &template("{caption_html}|{post_url}"),
            &item(Some("{post_url}"), "https://example.com/"),
            "i",
        );
        assert_eq!(html, "{post_url}|https://example.com/");
    }

    #[test]
    fn css_blocks_pass_through() {
        let layout = LayoutTemplate {
            body_html: "<style>{css_content}</style><style>p { margin: 0; }</style>".to_string(),
            css_text: "body { margin: 0; }".to_string(),
        };
        let html = render(&layout, &item(None, "p"), "i");
        assert_eq!(
            html,
            "<style>body { margin: 0; }</style><style>p { margin: 0; }</style>"
        );
    }

    #[test]
    fn rendered_chapters_are_well_formed() {
        let html = render(
            &template(STRICT),
            &item(
                Some("Post with <html> & \"quotes\" it's\nsecond line"),
                "https://www.instagram.com/p/DEF456/?utm_source=test&ref=share",
            ),
            "images/1.jpg",
        );
        assert_eq!(validate_xhtml(&html), Ok(()));
    }

    #[test]
    fn builtin_layout_renders_well_formed_chapters() {
        let html = render(
            &LayoutTemplate::builtin(),
            &item(Some("Tokyo & Kyoto <3\n#travel"), "https://www.instagram.com/p/A/?a=1&b=2"),
            "images/1.jpg",
        );
        assert_eq!(validate_xhtml(&html), Ok(()));
    }

    #[test]
    fn validation_catches_broken_markup() {
        assert!(validate_xhtml("<html><body><p>unclosed</body></html>").is_err());
        assert!(validate_xhtml("<html><body>").is_err());
        assert!(validate_xhtml("<p>fish & chips</p>").is_err());
        assert!(validate_xhtml("<p>&nbsp;</p>").is_err());
        assert!(validate_xhtml(r#"<a href="?a=1&b=2">x</a>"#).is_err());
    }

    #[tokio::test]
    async fn loads_layout_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LAYOUT_HTML_FILE), "<h1>{chapter_title}</h1>").unwrap();
        std::fs::write(dir.path().join(LAYOUT_CSS_FILE), "h1 { color: red; }").unwrap();

        let layout = load_layout_template(dir.path()).await.unwrap();
        assert_eq!(layout.body_html, "<h1>{chapter_title}</h1>");
        assert_eq!(layout.css_text, "h1 { color: red; }");
    }

    #[tokio::test]
    async fn missing_stylesheet_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LAYOUT_HTML_FILE), "<h1>{chapter_title}</h1>").unwrap();

        let err = load_layout_template(dir.path()).await.unwrap_err();
        match err {
            Error::LayoutRead { path, .. } => assert!(path.ends_with(LAYOUT_CSS_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn layout_without_title_placeholder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LAYOUT_HTML_FILE), "<h1>static</h1>").unwrap();
        std::fs::write(dir.path().join(LAYOUT_CSS_FILE), "").unwrap();

        let err = load_layout_template(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidLayout { .. }));
    }
}
