use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::services::SlackClient;

#[derive(Debug, Deserialize)]
pub struct ShareFileRequest {
    pub channel_id: Option<String>,
    pub document_id: Option<String>,
    #[serde(default)]
    pub comment: String,
}

fn slack(state: &AppState) -> Result<&SlackClient, ApiError> {
    state.slack.as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("SLACK_BOT_TOKEN is not configured".to_string()))
}

/// Public link to a Drive file
pub fn public_url(document_id: &str) -> String {
    format!("https://drive.google.com/file/d/{}/view", document_id)
}

/// Text posted to the channel: the comment (if any) on its own line, then the link
fn share_message(comment: &str, url: &str) -> String {
    if comment.is_empty() {
        url.to_string()
    } else {
        format!("{}\n{}", comment, url)
    }
}

/// `GET /list_channels`
pub async fn list_channels(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let channels = slack(&state)?.list_channels().await?;
    Ok(HttpResponse::Ok().json(json!({ "ok": true, "channels": channels })))
}

/// `POST /shareFileOnSlack`: make a Drive file public and post its link to a channel
pub async fn share_file_on_slack(
    state: web::Data<AppState>,
    body: web::Json<ShareFileRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let channel_id = body.channel_id.filter(|c| !c.is_empty());
    let document_id = body.document_id.filter(|d| !d.is_empty());
    let (Some(channel_id), Some(document_id)) = (channel_id, document_id) else {
        return Err(ApiError::InvalidRequest("channel_id and document_id are required".to_string()));
    };

    let slack = slack(&state)?;
    state.drive.share_publicly(&document_id).await?;

    let url = public_url(&document_id);
    let message_id = slack.post_message(&channel_id, &share_message(&body.comment, &url)).await?;
    info!("Shared document {} on channel {}", document_id, channel_id);

    Ok(HttpResponse::Ok().json(json!({
        "ok": true,
        "message_id": message_id,
        "public_url": url,
        "message": "Google Drive file link shared successfully",
    })))
}
