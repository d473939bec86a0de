use anyhow::{Result, Context};
use async_trait::async_trait;
use thirtyfour::prelude::*;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::browser::{BrowserError, PageBrowser};
use crate::cli::config::BrowserSettings;

/// WebDriver error texts meaning the session itself is gone rather than the page
const SESSION_FAILURE_MARKERS: &[&str] = &[
    "invalid session id",
    "session not created",
    "no such window",
    "chrome not reachable",
    "not connected to devtools",
    "connection refused",
    "error sending request",
    "error trying to connect",
];

/// Whether a WebDriver error means the browser session can no longer be used
fn is_session_failure(message: &str) -> bool {
    let message = message.to_lowercase();
    SESSION_FAILURE_MARKERS.iter().any(|marker| message.contains(marker))
}

/// WebDriver-backed headless browser session
pub struct BrowserSession {
    /// Browser settings
    config: BrowserSettings,

    /// WebDriver instance
    driver: Option<WebDriver>,
}

impl BrowserSession {
    /// Create a new browser session
    pub fn new(config: BrowserSettings) -> Self {
        Self {
            config,
            driver: None,
        }
    }

    /// Connect to the WebDriver server and open a browser
    pub async fn initialize(&mut self) -> Result<()> {
        // Close any existing session
        self.close().await;

        let mut caps = DesiredCapabilities::chrome();

        if let Some(user_agent) = &self.config.user_agent {
            caps.add_chrome_arg(&format!("--user-agent={}", user_agent))?;
        }

        caps.add_chrome_arg(&format!("--window-size={},{}", self.config.window_width, self.config.window_height))?;

        if self.config.headless {
            caps.set_headless()?;
        }

        // Needed when running inside containers
        caps.add_chrome_arg("--no-sandbox")?;
        caps.add_chrome_arg("--disable-dev-shm-usage")?;

        let driver = WebDriver::new(&self.config.webdriver_url, caps).await
            .context(format!("Failed to connect to WebDriver at {}", self.config.webdriver_url))?;

        driver.set_page_load_timeout(Duration::from_secs(self.config.page_load_timeout_secs)).await
            .context("Failed to set page load timeout")?;

        info!("Browser session initialized via {}", self.config.webdriver_url);
        self.driver = Some(driver);

        Ok(())
    }

    fn driver(&self) -> Result<&WebDriver, BrowserError> {
        self.driver.as_ref().ok_or(BrowserError::NotInitialized)
    }

    /// Close the browser session
    pub async fn close(&mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.quit().await {
                error!("Error closing browser session: {}", e);
            }
            debug!("Browser session closed");
        }
    }
}

#[async_trait]
impl PageBrowser for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let driver = self.driver()?;

        debug!("Navigating to: {}", url);
        driver.goto(url).await.map_err(|e| {
            let reason = e.to_string();
            if is_session_failure(&reason) {
                BrowserError::Session(format!("failed to navigate to {}: {}", url, reason))
            } else {
                BrowserError::Navigation { url: url.to_string(), reason }
            }
        })
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        let driver = self.driver()?;

        driver.source().await
            .map_err(|e| BrowserError::Session(format!("failed to get page source: {}", e)))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            // Only possible while a runtime is still around
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    if let Err(e) = driver.quit().await {
                        error!("Error closing browser session during drop: {}", e);
                    }
                });
            }
        }
    }
}
