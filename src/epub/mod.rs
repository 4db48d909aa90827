//! Turns a filtered list of posts into an EPUB 3 book.
//!
//! Each post becomes one chapter rendered from an XHTML layout template, with
//! its image downloaded and embedded. A cover image is rendered from the
//! book's metadata, then everything is packaged by an [`Packager`].

mod builder;
mod cover;
mod download;
mod package;
mod template;
mod types;

pub use builder::*;
pub use cover::*;
pub use download::*;
pub use package::*;
pub use template::*;
pub use types::*;
