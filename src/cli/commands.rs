use anyhow::{Result, Context};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn, error};

use crate::api::{self, AppState};
use crate::browser::{BrowserHandle, BrowserSession};
use crate::cli::config::ServiceConfig;
use crate::crawler::{CrawlerController, ScrapeRequest};
use crate::services::{DocsClient, SlackClient};
use crate::storage::{DriveClient, RemoteStorage, TokenStore};

/// Start the browser session; `None` if it could not be opened
async fn start_browser(config: &ServiceConfig) -> Option<BrowserHandle> {
    let mut session = BrowserSession::new(config.browser.clone());

    match session.initialize().await {
        Ok(()) => Some(BrowserHandle::new(Box::new(session), config.browser.settle_delay())),
        Err(e) => {
            error!("Browser session unavailable, scraping is disabled: {:#}", e);
            None
        }
    }
}

/// Build every collaborator the service needs
async fn build_state(config: &ServiceConfig) -> Result<AppState> {
    let tokens = TokenStore::new(&config.google.token_file);
    let drive = DriveClient::new(&config.google, tokens.clone())?;
    let docs = DocsClient::new(&config.google, tokens.clone())?;

    let storage: Option<Arc<dyn RemoteStorage>> = match drive.verify().await {
        Ok(()) => Some(Arc::new(drive.clone())),
        Err(e) => {
            warn!("Drive storage unavailable ({}), scraping is disabled: {}", tokens.path().display(), e);
            None
        }
    };

    let browser = start_browser(config).await;

    let slack = SlackClient::from_settings(&config.slack)?;
    if slack.is_none() {
        warn!("SLACK_BOT_TOKEN is not set; Slack endpoints are disabled");
    }

    let crawler = CrawlerController::new(
        browser,
        storage,
        config.crawler.clone(),
        config.server.max_concurrent_tasks,
    );

    Ok(AppState {
        crawler: Arc::new(crawler),
        drive,
        docs,
        slack,
    })
}

/// Run the HTTP service
pub async fn serve(config: ServiceConfig, host: String, port: u16) -> Result<()> {
    let state = build_state(&config).await?;

    if !state.crawler.is_ready() {
        warn!("Scrape submissions will be answered with 503 until the service is restarted");
    }

    api::run_server(state, &host, port).await
}

/// Crawl one site in the foreground
pub async fn crawl(config: ServiceConfig, url: String, folder: String, limit: Option<i64>) -> Result<()> {
    let state = build_state(&config).await?;

    let request = ScrapeRequest {
        url: Some(url),
        max_pages: limit,
        folder_id: Some(folder),
    };
    let submitted = state.crawler.submit(request).await?;
    info!("Crawl task {} started", submitted.task_id);

    submitted.handle.await.context("Crawl worker panicked")?;

    let task = state.crawler.status(&submitted.task_id).await
        .context("Task disappeared from the registry")?;

    println!("Task ID: {}", task.task_id);
    println!("Status: {}", task.status);
    println!("Message: {}", task.message);
    for reference in task.data.iter().flatten() {
        println!("  - {}", reference);
    }

    Ok(())
}

/// Show the effective configuration
pub fn show_config(config: &ServiceConfig, path: Option<&Path>) -> Result<()> {
    let source = path.map(Path::to_path_buf).unwrap_or_else(ServiceConfig::default_path);

    let mut shown = config.clone();
    if shown.slack.bot_token.is_some() {
        shown.slack.bot_token = Some("********".to_string());
    }

    println!("Configuration loaded from: {}", source.display());
    println!("{}", shown.to_yaml()?);

    Ok(())
}
