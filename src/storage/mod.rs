pub mod drive;
pub mod token;

use async_trait::async_trait;
use thiserror::Error;

// Re-export common types
pub use drive::DriveClient;
pub use token::TokenStore;

/// Errors returned by the remote storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("User not authenticated. Please authenticate at /startAuth")]
    NotAuthenticated,

    #[error("failed to read OAuth token: {0}")]
    Token(String),

    #[error("storage API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected storage response: {0}")]
    InvalidResponse(String),
}

/// Remote folder/file hierarchy the crawler archives pages into
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Create a folder named `name` under `parent_id`, returning the new folder id
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StorageError>;

    /// Upload `content` as a file under `parent_id`, returning the new file id
    async fn upload_file(
        &self,
        name: &str,
        parent_id: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<String, StorageError>;

    /// Make the file readable by anyone holding its link
    async fn share_file(&self, file_id: &str) -> Result<(), StorageError>;
}
