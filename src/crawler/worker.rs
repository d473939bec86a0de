use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::{BrowserError, BrowserHandle};
use crate::cli::config::CrawlerSettings;
use crate::crawler::page::{extract_links, page_file_name, site_folder_name};
use crate::crawler::registry::TaskRegistry;
use crate::crawler::scheduler::Scheduler;
use crate::crawler::task::TaskUpdate;
use crate::storage::{RemoteStorage, StorageError};

/// Everything a worker needs to run one crawl
#[derive(Debug, Clone)]
pub struct CrawlJob {
    pub task_id: String,
    pub seed: Url,
    /// Maximum number of pages to archive, `None` for unbounded
    pub budget: Option<usize>,
    /// Remote folder the per-site folder is created under
    pub folder_id: String,
}

/// Failures that abort a whole crawl
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to create folder '{name}': {source}")]
    FolderSetup {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Result of a finished crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlOutcome {
    pub pages_scraped: usize,
    pub references: Vec<String>,
}

/// Breadth-first crawler that archives each rendered page to remote storage
pub struct CrawlWorker {
    registry: Arc<TaskRegistry>,
    browser: BrowserHandle,
    storage: Arc<dyn RemoteStorage>,
    settings: CrawlerSettings,
}

impl CrawlWorker {
    pub fn new(
        registry: Arc<TaskRegistry>,
        browser: BrowserHandle,
        storage: Arc<dyn RemoteStorage>,
        settings: CrawlerSettings,
    ) -> Self {
        Self {
            registry,
            browser,
            storage,
            settings,
        }
    }

    /// Run the crawl for `job`, reporting its final state through the registry
    pub async fn run(&self, job: CrawlJob) {
        let update = match self.crawl(&job).await {
            Ok(outcome) => {
                info!("Task {} completed: {} pages scraped", job.task_id, outcome.pages_scraped);
                TaskUpdate::Completed {
                    message: format!("Scraped {} pages", outcome.pages_scraped),
                    data: outcome.references,
                }
            }
            Err(e) => {
                error!("Task {} failed: {}", job.task_id, e);
                TaskUpdate::Failed { message: e.to_string() }
            }
        };

        if let Err(e) = self.registry.update(&job.task_id, update).await {
            error!("Failed to record final state of task {}: {}", job.task_id, e);
        }
    }

    async fn crawl(&self, job: &CrawlJob) -> Result<CrawlOutcome, CrawlError> {
        let folder_name = site_folder_name(&job.seed);
        let site_folder = self.storage.create_folder(&folder_name, &job.folder_id).await
            .map_err(|source| CrawlError::FolderSetup { name: folder_name.clone(), source })?;
        debug!("Task {} archiving into folder {} ({})", job.task_id, folder_name, site_folder);

        let seed = job.seed.as_str();
        let processing = TaskUpdate::Processing { message: format!("scraping {}", seed) };
        if let Err(e) = self.registry.update(&job.task_id, processing).await {
            warn!("Failed to mark task {} as processing: {}", job.task_id, e);
        }

        let mut scheduler = Scheduler::new(seed);
        let mut pages_scraped = 0;
        let mut references = Vec::new();

        while let Some(url) = scheduler.next_url() {
            let page = match self.browser.render(&url).await {
                Ok(page) => page,
                Err(e) if e.is_page_level() => {
                    warn!("Skipping {}: {}", url, e);
                    scheduler.mark_visited(&url);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match self.archive(&url, &site_folder, &page.markup).await {
                Ok(reference) => references.push(reference),
                Err(e) => warn!("Failed to archive {}: {}", url, e),
            }

            scheduler.mark_visited(&url);
            pages_scraped += 1;

            if job.budget.is_some_and(|budget| pages_scraped >= budget) {
                debug!("Task {} reached its budget of {} pages", job.task_id, pages_scraped);
                break;
            }

            let admitted = scheduler.enqueue_links(extract_links(&page.markup, &page.url));
            debug!("Queued {} new links from {}", admitted, url);
        }

        debug!("Task {} visited {} URLs", job.task_id, scheduler.visited_count());
        Ok(CrawlOutcome { pages_scraped, references })
    }

    /// Upload one page, share it by link and build its public reference
    async fn archive(&self, url: &str, site_folder: &str, markup: &str) -> Result<String, StorageError> {
        let file_name = page_file_name(url, &self.settings.page_extension);
        let file_id = self.storage
            .upload_file(&file_name, site_folder, &self.settings.page_mime_type, markup.as_bytes().to_vec())
            .await?;
        self.storage.share_file(&file_id).await?;

        Ok(self.settings.reference_template.replace("{id}", &file_id))
    }
}
