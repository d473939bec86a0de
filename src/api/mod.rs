pub mod documents;
pub mod error;
pub mod slack;
pub mod tasks;

use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::crawler::CrawlerController;
use crate::services::{DocsClient, SlackClient};
use crate::storage::DriveClient;

/// Shared state handed to every request handler
pub struct AppState {
    pub crawler: Arc<CrawlerController>,
    pub drive: DriveClient,
    pub docs: DocsClient,
    pub slack: Option<SlackClient>,
}

const PRIVACY_POLICY: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Privacy Policy</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; line-height: 1.6; }
        h1 { color: #333; }
    </style>
</head>
<body>
    <h1>Privacy Policy</h1>
    <p>
        This application uses Google APIs to perform its operations. The app accesses user data
        only as necessary to fulfill its functionality, such as creating Google Docs. No user data
        is shared or stored beyond what is required to execute the requested functionality.
    </p>
    <p>
        The app complies with Google's User Data Policy, including the Limited Use requirements.
    </p>
    <p>
        If you have any questions or concerns about your data privacy, please contact us.
    </p>
</body>
</html>
"#;

/// `GET /privacy`
async fn privacy() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(PRIVACY_POLICY)
}

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::InvalidRequest(format!("invalid JSON body: {}", err)).into());

    cfg.app_data(json_config)
        .route("/privacy", web::get().to(privacy))
        .route("/scrapeWebsite", web::post().to(tasks::submit_scrape))
        .route("/taskStatus/{task_id}", web::get().to(tasks::task_status))
        .route("/listFiles", web::get().to(documents::list_files))
        .route("/readDoc", web::get().to(documents::read_doc))
        .route("/updateDoc", web::post().to(documents::update_doc))
        .route("/list_channels", web::get().to(slack::list_channels))
        .route("/shareFileOnSlack", web::post().to(slack::share_file_on_slack));
}

/// Serve the API until the server is stopped
pub async fn run_server(state: AppState, host: &str, port: u16) -> Result<()> {
    let state = web::Data::new(state);

    info!("Starting server at http://{}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))
    .context(format!("Failed to bind {}:{}", host, port))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserHandle;
    use crate::cli::config::{GoogleSettings, SlackSettings};
    use crate::crawler::worker::tests::{test_settings, FakeSite, RecordingStorage};
    use crate::storage::TokenStore;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::time::Duration;

    fn google_settings() -> GoogleSettings {
        GoogleSettings {
            token_file: PathBuf::from("/nonexistent/site-archiver/token.json"),
            drive_api_url: "http://127.0.0.1:9".to_string(),
            drive_upload_url: "http://127.0.0.1:9".to_string(),
            docs_api_url: "http://127.0.0.1:9".to_string(),
        }
    }

    fn state_with(crawler: CrawlerController) -> web::Data<AppState> {
        let google = google_settings();
        let tokens = TokenStore::new(&google.token_file);
        let slack = SlackClient::from_settings(&SlackSettings {
            api_url: "http://127.0.0.1:9".to_string(),
            bot_token: None,
        })
        .unwrap();

        web::Data::new(AppState {
            crawler: Arc::new(crawler),
            drive: DriveClient::new(&google, tokens.clone()).unwrap(),
            docs: DocsClient::new(&google, tokens).unwrap(),
            slack,
        })
    }

    fn ready_crawler() -> CrawlerController {
        let site = FakeSite::new(&[("https://example.com/", &[])]);
        CrawlerController::new(
            Some(BrowserHandle::new(Box::new(site), Duration::ZERO)),
            Some(Arc::new(RecordingStorage::default())),
            test_settings(),
            2,
        )
    }

    #[actix_web::test]
    async fn test_submit_then_poll() {
        let state = state_with(ready_crawler());
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/scrapeWebsite")
            .set_json(json!({ "url": "https://example.com/", "max_pages": 1, "folder_id": "root" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let body: Value = test::read_body_json(resp).await;
        let task_id = body["task_id"].as_str().unwrap().to_string();

        let mut status = Value::Null;
        for _ in 0..50 {
            let req = test::TestRequest::get().uri(&format!("/taskStatus/{}", task_id)).to_request();
            status = test::call_and_read_body_json(&app, req).await;
            if status["status"] == "completed" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(status["status"], "completed");
        assert_eq!(status["message"], "Scraped 1 pages");
        assert_eq!(status["data"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_unknown_task_is_404() {
        let app = test::init_service(App::new().app_data(state_with(ready_crawler())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/taskStatus/does-not-exist").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_invalid_submission_is_400() {
        let app = test::init_service(App::new().app_data(state_with(ready_crawler())).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/scrapeWebsite")
            .set_json(json!({ "url": "not-a-url", "folder_id": "root" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/scrapeWebsite")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_submission_without_browser_is_503() {
        let crawler = CrawlerController::new(None, Some(Arc::new(RecordingStorage::default())), test_settings(), 1);
        let app = test::init_service(App::new().app_data(state_with(crawler)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/scrapeWebsite")
            .set_json(json!({ "url": "https://example.com/", "folder_id": "root" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_unauthenticated_google_calls_are_401() {
        let app = test::init_service(App::new().app_data(state_with(ready_crawler())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/listFiles").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri("/readDoc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_slack_not_configured_is_503() {
        let app = test::init_service(App::new().app_data(state_with(ready_crawler())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/list_channels").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_privacy_page() {
        let app = test::init_service(App::new().app_data(state_with(ready_crawler())).configure(configure)).await;

        let req = test::TestRequest::get().uri("/privacy").to_request();
        let body = test::call_and_read_body(&app, req).await;

        assert!(std::str::from_utf8(&body).unwrap().contains("<h1>Privacy Policy</h1>"));
    }
}
