use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::cli::config::GoogleSettings;
use crate::storage::{RemoteStorage, StorageError, TokenStore};

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// A file entry as returned by the Drive listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Google Drive v3 REST client
#[derive(Clone)]
pub struct DriveClient {
    client: Client,
    tokens: TokenStore,
    api_url: String,
    upload_url: String,
}

impl DriveClient {
    pub fn new(settings: &GoogleSettings, tokens: TokenStore) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            tokens,
            api_url: settings.drive_api_url.trim_end_matches('/').to_string(),
            upload_url: settings.drive_upload_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check that credentials are available
    pub async fn verify(&self) -> Result<(), StorageError> {
        self.tokens.access_token().await.map(|_| ())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StorageError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StorageError::NotAuthenticated);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api { status: status.as_u16(), body });
        }

        Ok(response)
    }

    async fn created_id(response: Response) -> Result<String, StorageError> {
        let created: CreatedFile = response.json().await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        Ok(created.id)
    }

    /// Make a file readable by anyone with the link
    pub async fn share_publicly(&self, file_id: &str) -> Result<(), StorageError> {
        let endpoint = format!("{}/drive/v3/files/{}/permissions", self.api_url, file_id);
        let request = self.client.post(&endpoint)
            .query(&[("fields", "id")])
            .json(&json!({ "type": "anyone", "role": "reader" }));

        self.send(request).await?;
        debug!("Shared file {} publicly", file_id);

        Ok(())
    }

    /// List Google Docs documents visible to the user
    pub async fn list_documents(&self) -> Result<Vec<DriveFile>, StorageError> {
        let endpoint = format!("{}/drive/v3/files", self.api_url);
        let query = format!("mimeType='{}'", DOCUMENT_MIME_TYPE);
        let request = self.client.get(&endpoint)
            .query(&[
                ("pageSize", "10"),
                ("fields", "files(id, name, mimeType)"),
                ("q", query.as_str()),
            ]);

        let list: FileList = self.send(request).await?
            .json().await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        Ok(list.files)
    }
}

/// Body of a `multipart/related` upload: JSON metadata part followed by the media part
fn multipart_related_body(boundary: &str, metadata: &serde_json::Value, mime_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[async_trait]
impl RemoteStorage for DriveClient {
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StorageError> {
        let endpoint = format!("{}/drive/v3/files", self.api_url);
        let request = self.client.post(&endpoint)
            .query(&[("fields", "id")])
            .json(&json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
                "parents": [parent_id],
            }));

        let id = Self::created_id(self.send(request).await?).await?;
        debug!("Created folder {} ({}) under {}", name, id, parent_id);

        Ok(id)
    }

    async fn upload_file(
        &self,
        name: &str,
        parent_id: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<String, StorageError> {
        let endpoint = format!("{}/upload/drive/v3/files", self.upload_url);
        let boundary = format!("site-archiver-{}", uuid::Uuid::new_v4().simple());
        let metadata = json!({ "name": name, "parents": [parent_id] });
        let body = multipart_related_body(&boundary, &metadata, mime_type, &content);

        let request = self.client.post(&endpoint)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(reqwest::header::CONTENT_TYPE, format!("multipart/related; boundary={}", boundary))
            .body(body);

        let id = Self::created_id(self.send(request).await?).await?;
        debug!("Uploaded {} ({} bytes) as {}", name, content.len(), id);

        Ok(id)
    }

    async fn share_file(&self, file_id: &str) -> Result<(), StorageError> {
        self.share_publicly(file_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_file() -> PathBuf {
        let path = std::env::temp_dir().join(format!("site-archiver-drive-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"token": "test-token"}"#).unwrap();
        path
    }

    fn client_for(server: &MockServer, token_path: PathBuf) -> DriveClient {
        let settings = GoogleSettings {
            token_file: token_path.clone(),
            drive_api_url: server.uri(),
            drive_upload_url: server.uri(),
            docs_api_url: server.uri(),
        };
        DriveClient::new(&settings, TokenStore::new(token_path)).unwrap()
    }

    #[tokio::test]
    async fn test_create_folder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({
                "name": "example.com",
                "mimeType": FOLDER_MIME_TYPE,
                "parents": ["root-folder"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "folder-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let token = token_file();
        let drive = client_for(&server, token.clone());
        let id = drive.create_folder("example.com", "root-folder").await.unwrap();

        assert_eq!(id, "folder-1");
        std::fs::remove_file(token).ok();
    }

    #[tokio::test]
    async fn test_upload_file_sends_multipart_related() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/drive/v3/files"))
            .and(query_param("uploadType", "multipart"))
            .and(body_string_contains(r#""name":"index.html""#))
            .and(body_string_contains("<html>hello</html>"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file-9" })))
            .expect(1)
            .mount(&server)
            .await;

        let token = token_file();
        let drive = client_for(&server, token.clone());
        let id = drive
            .upload_file("index.html", "folder-1", "text/html", b"<html>hello</html>".to_vec())
            .await
            .unwrap();

        assert_eq!(id, "file-9");
        std::fs::remove_file(token).ok();
    }

    #[tokio::test]
    async fn test_share_file_grants_anyone_read() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files/file-9/permissions"))
            .and(body_json(json!({ "type": "anyone", "role": "reader" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "anyoneWithLink" })))
            .expect(1)
            .mount(&server)
            .await;

        let token = token_file();
        let drive = client_for(&server, token.clone());
        drive.share_file("file-9").await.unwrap();

        std::fs::remove_file(token).ok();
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(404).set_body_string("File not found: root"))
            .mount(&server)
            .await;

        let token = token_file();
        let drive = client_for(&server, token.clone());
        let err = drive.create_folder("example.com", "root").await.unwrap_err();

        match err {
            StorageError::Api { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("File not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
        std::fs::remove_file(token).ok();
    }

    #[tokio::test]
    async fn test_missing_token_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let drive = client_for(&server, PathBuf::from("/nonexistent/token.json"));
        let err = drive.create_folder("example.com", "root").await.unwrap_err();

        assert!(matches!(err, StorageError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_list_documents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(query_param("q", "mimeType='application/vnd.google-apps.document'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [
                    { "id": "d1", "name": "Notes", "mimeType": DOCUMENT_MIME_TYPE }
                ]
            })))
            .mount(&server)
            .await;

        let token = token_file();
        let drive = client_for(&server, token.clone());
        let files = drive.list_documents().await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "Notes");
        std::fs::remove_file(token).ok();
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_related_body("b", &json!({ "name": "a.html" }), "text/html", b"<p>x</p>");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("--b\r\nContent-Type: application/json"));
        assert!(text.contains("Content-Type: text/html\r\n\r\n<p>x</p>"));
        assert!(text.ends_with("\r\n--b--\r\n"));
    }
}
