use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Provider id of the Instagram account in a session.
pub const INSTAGRAM: &str = "instagram";

/// Looks up the access token the current user linked for a provider.
///
/// Token issuance and refresh belong to whatever owns the session; resolvers
/// only read what is already there.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve_access_token(&self, provider: &str) -> Result<String, AuthError>;
}

/// An account linked to the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// A signed-in user and the accounts they linked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub accounts: Vec<LinkedAccount>,
}

impl Session {
    pub fn access_token(&self, provider: &str) -> Result<String, AuthError> {
        if self.user.is_none() {
            return Err(AuthError::NotAuthenticated);
        }
        let account = self
            .accounts
            .iter()
            .find(|account| account.provider == provider)
            .ok_or_else(|| AuthError::AccountNotLinked {
                provider: provider.to_string(),
            })?;
        account
            .access_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::TokenMissing {
                provider: provider.to_string(),
            })
    }
}

/// Resolves tokens from a JSON session file, unless a token was handed over
/// directly (e.g. through an environment variable).
#[derive(Debug, Clone)]
pub struct FileSessionResolver {
    session_file: PathBuf,
    token_override: Option<String>,
}

impl FileSessionResolver {
    pub fn new<P: Into<PathBuf>>(session_file: P) -> Self {
        Self {
            session_file: session_file.into(),
            token_override: None,
        }
    }

    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        self.token_override = token.filter(|token| !token.is_empty());
        self
    }

    pub fn session_file(&self) -> &Path {
        &self.session_file
    }
}

#[async_trait]
impl SessionResolver for FileSessionResolver {
    async fn resolve_access_token(&self, provider: &str) -> Result<String, AuthError> {
        if let Some(token) = &self.token_override {
            log::debug!("using access token supplied on the command line or environment");
            return Ok(token.clone());
        }

        let contents = match tokio::fs::read_to_string(&self.session_file).await {
            Ok(contents) => contents,
            Err(e) => {
                log::info!(
                    "no session at {}: {e}",
                    self.session_file.display()
                );
                return Err(AuthError::NotAuthenticated);
            }
        };
        let session: Session = serde_json::from_str(&contents).map_err(|e| {
            log::warn!(
                "session file {} is not valid: {e}",
                self.session_file.display()
            );
            AuthError::NotAuthenticated
        })?;
        session.access_token(provider)
    }
}
