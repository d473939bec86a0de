pub mod session;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

// Re-export common types
pub use session::BrowserSession;

/// Errors raised while driving the browser
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser session not initialized")]
    NotInitialized,

    /// The page itself could not be loaded; the session is still usable
    #[error("failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// The session is broken; nothing further can be rendered
    #[error("browser session error: {0}")]
    Session(String),
}

impl BrowserError {
    /// Whether the error only concerns the page that was being rendered
    pub fn is_page_level(&self) -> bool {
        matches!(self, BrowserError::Navigation { .. })
    }
}

/// Minimal browser automation surface the crawler depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageBrowser: Send + Sync {
    /// Load `url` in the current tab
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Serialized DOM of the currently loaded page
    async fn page_source(&self) -> Result<String, BrowserError>;
}

/// A page after client-side rendering
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub markup: String,
}

/// Shared handle to the single browser session.
///
/// All renders go through one mutex, so at most one page is being navigated at any
/// time no matter how many crawl workers are running.
#[derive(Clone)]
pub struct BrowserHandle {
    browser: Arc<Mutex<Box<dyn PageBrowser>>>,
    settle_delay: Duration,
}

impl BrowserHandle {
    pub fn new(browser: Box<dyn PageBrowser>, settle_delay: Duration) -> Self {
        Self {
            browser: Arc::new(Mutex::new(browser)),
            settle_delay,
        }
    }

    /// Navigate to `url`, wait for the settle delay, and read back the rendered markup
    pub async fn render(&self, url: &str) -> Result<RenderedPage, BrowserError> {
        let browser = self.browser.lock().await;

        browser.navigate(url).await?;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let markup = browser.page_source().await?;
        debug!("Rendered {} ({} bytes)", url, markup.len());

        Ok(RenderedPage {
            url: url.to_string(),
            markup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_render_reads_source_after_navigation() {
        let mut browser = MockPageBrowser::new();
        let mut seq = mockall::Sequence::new();
        browser.expect_navigate()
            .with(eq("https://example.com/"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        browser.expect_page_source()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok("<html></html>".to_string()));

        let handle = BrowserHandle::new(Box::new(browser), Duration::ZERO);
        let page = handle.render("https://example.com/").await.unwrap();

        assert_eq!(page.url, "https://example.com/");
        assert_eq!(page.markup, "<html></html>");
    }

    #[tokio::test]
    async fn test_navigation_failure_skips_source() {
        let mut browser = MockPageBrowser::new();
        browser.expect_navigate().returning(|url| {
            Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "timeout".to_string(),
            })
        });
        browser.expect_page_source().never();

        let handle = BrowserHandle::new(Box::new(browser), Duration::ZERO);
        let err = handle.render("https://example.com/slow").await.unwrap_err();

        assert!(err.is_page_level());
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_is_read_after_settle_delay() {
        let marks = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut browser = MockPageBrowser::new();
        let navigated = marks.clone();
        browser.expect_navigate().returning(move |_| {
            navigated.lock().unwrap().push(("navigate", Instant::now()));
            Ok(())
        });
        let read = marks.clone();
        browser.expect_page_source().returning(move || {
            read.lock().unwrap().push(("source", Instant::now()));
            Ok("<html></html>".to_string())
        });

        let settle_delay = Duration::from_millis(2000);
        let handle = BrowserHandle::new(Box::new(browser), settle_delay);
        handle.render("https://example.com/").await.unwrap();

        let marks = marks.lock().unwrap();
        assert_eq!(marks.iter().map(|(event, _)| *event).collect::<Vec<_>>(), vec!["navigate", "source"]);
        assert!(marks[1].1 - marks[0].1 >= settle_delay);
    }

    #[test]
    fn test_session_errors_are_not_page_level() {
        assert!(!BrowserError::Session("gone".to_string()).is_page_level());
        assert!(!BrowserError::NotInitialized.is_page_level());
    }
}
