use anyhow::Context;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::cli::config::GoogleSettings;
use crate::storage::{StorageError, TokenStore};

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    body: Option<Body>,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
struct StructuralElement {
    paragraph: Option<Paragraph>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    #[serde(default)]
    elements: Vec<ParagraphElement>,
}

#[derive(Debug, Deserialize)]
struct ParagraphElement {
    #[serde(rename = "textRun")]
    text_run: Option<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    #[serde(default)]
    content: String,
}

impl Document {
    /// Plain text of all paragraph text runs, in document order
    fn plain_text(&self) -> String {
        self.body.iter()
            .flat_map(|body| &body.content)
            .filter_map(|element| element.paragraph.as_ref())
            .flat_map(|paragraph| &paragraph.elements)
            .filter_map(|element| element.text_run.as_ref())
            .map(|run| run.content.as_str())
            .collect()
    }
}

/// Google Docs v1 REST client
#[derive(Clone)]
pub struct DocsClient {
    client: Client,
    tokens: TokenStore,
    api_url: String,
}

impl DocsClient {
    pub fn new(settings: &GoogleSettings, tokens: TokenStore) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            tokens,
            api_url: settings.docs_api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
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

    /// Read the text content of a document
    pub async fn read_text(&self, document_id: &str) -> Result<String, StorageError> {
        let token = self.tokens.access_token().await?;
        let endpoint = format!("{}/v1/documents/{}", self.api_url, document_id);

        let response = self.client.get(&endpoint).bearer_auth(token).send().await?;
        let document: Document = Self::check(response).await?
            .json().await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        Ok(document.plain_text())
    }

    /// Insert `text` at `index` in the document body
    pub async fn insert_text(&self, document_id: &str, text: &str, index: i64) -> Result<(), StorageError> {
        let token = self.tokens.access_token().await?;
        let endpoint = format!("{}/v1/documents/{}:batchUpdate", self.api_url, document_id);
        let request = json!({
            "requests": [{
                "insertText": {
                    "location": { "index": index },
                    "text": text,
                }
            }]
        });

        let response = self.client.post(&endpoint).bearer_auth(token).json(&request).send().await?;
        Self::check(response).await?;
        debug!("Inserted {} chars into document {} at {}", text.len(), document_id, index);

        Ok(())
    }
}
