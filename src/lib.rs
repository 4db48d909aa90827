//! Turn an Instagram media feed into an EPUB book.
//!
//! The [`instagram`] module talks to the Graph API and narrows the feed down;
//! the [`epub`] module downloads the images, renders one XHTML chapter per
//! post, rasterizes a cover and packages everything into a single container.

pub mod epub;
mod error;
pub mod instagram;
#[cfg(test)]
mod test_server;

pub use error::{AuthError, Error, Result};
