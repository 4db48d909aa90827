//! Error types for feed fetching and book assembly.
//!
//! Every variant here is fatal for the build it occurs in. Soft failures (a
//! chapter that does not parse as XHTML) are logged, never returned.

use reqwest::StatusCode;
use std::path::PathBuf;

/// Failures reported by a [`SessionResolver`](crate::instagram::SessionResolver).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("{provider} account not linked")]
    AccountNotLinked { provider: String },
    #[error("{provider} access token missing from session")]
    TokenMissing { provider: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("access token missing")]
    MissingAccessToken,

    #[error("Graph API error: {status}")]
    GraphApi { status: StatusCode },

    #[error("media fetch failed: {status}")]
    MediaFetch { status: StatusCode, url: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read layout file `{}`", path.display())]
    LayoutRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid layout `{}`: {placeholder} placeholder not found", path.display())]
    InvalidLayout {
        path: PathBuf,
        placeholder: &'static str,
    },

    /// The headless browser could not produce a cover image.
    #[error(transparent)]
    Cover(anyhow::Error),

    /// The EPUB container could not be written.
    #[error(transparent)]
    Package(anyhow::Error),

    #[error("I/O error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}
