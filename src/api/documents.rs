use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct ReadDocQuery {
    pub document_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocRequest {
    pub document_id: Option<String>,
    pub content: Option<String>,
    pub location_index: Option<i64>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `GET /listFiles`
pub async fn list_files(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let files = state.drive.list_documents().await?;
    Ok(HttpResponse::Ok().json(json!({ "files": files })))
}

/// `GET /readDoc?document_id=`
pub async fn read_doc(
    state: web::Data<AppState>,
    query: web::Query<ReadDocQuery>,
) -> Result<HttpResponse, ApiError> {
    let document_id = required(query.into_inner().document_id)
        .ok_or_else(|| ApiError::InvalidRequest("Document ID is required".to_string()))?;

    let content = state.docs.read_text(&document_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "content": content })))
}

/// `POST /updateDoc`: insert text at a location, the beginning of the body by default
pub async fn update_doc(
    state: web::Data<AppState>,
    body: web::Json<UpdateDocRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let (Some(document_id), Some(content)) = (required(body.document_id), required(body.content)) else {
        return Err(ApiError::InvalidRequest("Document ID and content are required".to_string()));
    };

    state.docs.insert_text(&document_id, &content, body.location_index.unwrap_or(1)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Content updated successfully in document: {}", document_id)
    })))
}
