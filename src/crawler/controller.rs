use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::BrowserHandle;
use crate::cli::config::CrawlerSettings;
use crate::crawler::page::normalize_seed;
use crate::crawler::registry::TaskRegistry;
use crate::crawler::task::Task;
use crate::crawler::worker::{CrawlJob, CrawlWorker};
use crate::storage::RemoteStorage;

/// Body of a crawl submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeRequest {
    pub url: Option<String>,
    /// Zero, negative or absent means unbounded
    pub max_pages: Option<i64>,
    pub folder_id: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    ServiceUnavailable(String),
}

/// A task accepted for crawling
#[derive(Debug)]
pub struct SubmittedTask {
    pub task_id: String,
    /// Completes when the worker has recorded the final state; dropping it detaches the worker
    pub handle: JoinHandle<()>,
}

/// Owns the task registry and the shared collaborators crawl workers run against
pub struct CrawlerController {
    registry: Arc<TaskRegistry>,
    browser: Option<BrowserHandle>,
    storage: Option<Arc<dyn RemoteStorage>>,
    settings: CrawlerSettings,
    permits: Arc<Semaphore>,
    runtime: Handle,
}

impl CrawlerController {
    /// Create a controller that spawns workers on the current runtime.
    ///
    /// `browser` and `storage` are `None` when they failed to initialize; submissions are
    /// then refused while status lookups keep working.
    pub fn new(
        browser: Option<BrowserHandle>,
        storage: Option<Arc<dyn RemoteStorage>>,
        settings: CrawlerSettings,
        max_concurrent_tasks: usize,
    ) -> Self {
        Self {
            registry: Arc::new(TaskRegistry::new()),
            browser,
            storage,
            settings,
            permits: Arc::new(Semaphore::new(max_concurrent_tasks.max(1))),
            runtime: Handle::current(),
        }
    }

    /// Validate a request, register a queued task and launch its worker without waiting on it
    pub async fn submit(&self, request: ScrapeRequest) -> Result<SubmittedTask, SubmitError> {
        let (browser, storage) = match (&self.browser, &self.storage) {
            (Some(browser), Some(storage)) => (browser.clone(), storage.clone()),
            (None, _) => return Err(SubmitError::ServiceUnavailable("browser session is not available".to_string())),
            (_, None) => return Err(SubmitError::ServiceUnavailable("remote storage is not available".to_string())),
        };

        let raw_url = request.url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| SubmitError::InvalidRequest("url is required".to_string()))?;
        let seed = normalize_seed(&raw_url).map_err(SubmitError::InvalidRequest)?;

        let folder_id = request.folder_id
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .ok_or_else(|| SubmitError::InvalidRequest("folder_id is required".to_string()))?;

        let budget = request.max_pages
            .filter(|n| *n > 0)
            .and_then(|n| usize::try_from(n).ok());

        let task_id = self.registry.create(seed.as_str()).await;
        info!("Queued task {} for {} (budget: {:?})", task_id, seed, budget);

        let job = CrawlJob {
            task_id: task_id.clone(),
            seed,
            budget,
            folder_id,
        };
        let worker = CrawlWorker::new(self.registry.clone(), browser, storage, self.settings.clone());
        let permits = self.permits.clone();

        let handle = self.runtime.spawn(async move {
            // Stays queued until a slot frees up
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Worker pool closed before task {} started: {}", job.task_id, e);
                    return;
                }
            };
            debug!("Task {} acquired a worker slot", job.task_id);
            worker.run(job).await;
        });

        Ok(SubmittedTask { task_id, handle })
    }

    /// Current state of a task
    pub async fn status(&self, task_id: &str) -> Option<Task> {
        self.registry.get(task_id).await
    }

    pub fn is_ready(&self) -> bool {
        self.browser.is_some() && self.storage.is_some()
    }
}
