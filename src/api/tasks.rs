use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::crawler::controller::ScrapeRequest;

/// `POST /scrapeWebsite`: queue a crawl and return its task id right away
pub async fn submit_scrape(
    state: web::Data<AppState>,
    body: web::Json<ScrapeRequest>,
) -> Result<HttpResponse, ApiError> {
    let submitted = state.crawler.submit(body.into_inner()).await?;
    info!("Accepted scrape task {}", submitted.task_id);

    // The worker keeps running after its handle is dropped
    drop(submitted.handle);

    Ok(HttpResponse::Accepted().json(json!({
        "task_id": submitted.task_id,
        "message": "task queued",
    })))
}

/// `GET /taskStatus/{task_id}`
pub async fn task_status(
    state: web::Data<AppState>,
    task_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let task_id = task_id.into_inner();
    let task = state.crawler.status(&task_id).await
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    Ok(HttpResponse::Ok().json(json!({
        "task_id": task.task_id,
        "status": task.status,
        "message": task.message,
        "data": task.data,
        "updated_at": task.updated_at,
    })))
}
