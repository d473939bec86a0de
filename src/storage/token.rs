use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::storage::StorageError;

/// Authorized-user credentials as written by the OAuth consent flow
#[derive(Debug, Deserialize)]
struct StoredCredentials {
    #[serde(alias = "access_token")]
    token: Option<String>,
}

/// Reads the OAuth access token from the token file.
///
/// The file is re-read on every call so a fresh consent is picked up without a restart.
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

    /// Current bearer token
    pub async fn access_token(&self) -> Result<String, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Token file {} not found", self.path.display());
                return Err(StorageError::NotAuthenticated);
            }
            Err(e) => return Err(StorageError::Token(e.to_string())),
        };

        let credentials: StoredCredentials = serde_json::from_str(&contents)
            .map_err(|e| StorageError::Token(e.to_string()))?;

        credentials.token
            .filter(|token| !token.is_empty())
            .ok_or(StorageError::NotAuthenticated)
    }
}
