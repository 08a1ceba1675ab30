use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::github::{FetchError, FetchErrorKind, GitHubClient};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to access token file: {0}")]
    Io(#[from] io::Error),

    #[error("Token was rejected: {0}")]
    Rejected(#[from] FetchError),
}

/// A single GitHub token persisted in a plain file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn store(&self, token: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token.trim())?;
        Ok(())
    }

    pub fn discard(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Load the stored token and check it against the API.
///
/// A token the API rejects is deleted and `None` returned. Other failures
/// (network, server errors) say nothing about the token, so it is kept and used.
pub async fn load_validated(store: &TokenStore, api_url: &str) -> Result<Option<String>, CredentialError> {
    let Some(token) = store.load()? else {
        return Ok(None);
    };

    let client = GitHubClient::with_api_url(api_url, Some(token.clone()))?;
    match client.validate_token().await {
        Ok(account) => {
            info!(login = %account.login, "using stored GitHub token");
            Ok(Some(token))
        }
        Err(e) if e.kind() == FetchErrorKind::Authorization => {
            warn!(path = %store.path().display(), error = %e, "stored token rejected; discarding it");
            store.discard()?;
            Ok(None)
        }
        Err(e) => {
            warn!(error = %e, "could not validate stored token; using it anyway");
            Ok(Some(token))
        }
    }
}

/// Validate `token` and persist it. Rejected tokens are never written.
pub async fn login(store: &TokenStore, api_url: &str, token: &str) -> Result<String, CredentialError> {
    let client = GitHubClient::with_api_url(api_url, Some(token.to_string()))?;
    let account = client.validate_token().await?;
    store.store(token)?;
    info!(login = %account.login, path = %store.path().display(), "stored GitHub token");
    Ok(account.login)
}
