use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use std::time::Duration;
use tracing::{info, debug, error};

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    pub browser: BrowserSettings,
    pub crawler: CrawlerSettings,
    pub google: GoogleSettings,
    pub slack: SlackSettings,
}

/// HTTP server settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Number of crawl workers allowed to run at the same time
    pub max_concurrent_tasks: usize,
}

/// Headless browser settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub page_load_timeout_secs: u64,
    /// Delay after navigation so client-side rendering can finish, in milliseconds
    pub settle_delay_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
}

/// Page archival settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrawlerSettings {
    pub page_extension: String,
    pub page_mime_type: String,
    /// Template for the reference returned per archived page; `{id}` is the remote file id
    pub reference_template: String,
}

/// Google Drive / Docs settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GoogleSettings {
    pub token_file: PathBuf,
    pub drive_api_url: String,
    pub drive_upload_url: String,
    pub docs_api_url: String,
}

/// Slack settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SlackSettings {
    pub api_url: String,
    pub bot_token: Option<String>,
}

impl BrowserSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_concurrent_tasks: 4,
            },
            browser: BrowserSettings {
                webdriver_url: "http://localhost:4444".to_string(),
                headless: true,
                page_load_timeout_secs: 30,
                settle_delay_ms: 2000,
                window_width: 1920,
                window_height: 1080,
                user_agent: None,
            },
            crawler: CrawlerSettings {
                page_extension: "html".to_string(),
                page_mime_type: "text/html".to_string(),
                reference_template: "https://drive.google.com/file/d/{id}/view".to_string(),
            },
            google: GoogleSettings {
                token_file: PathBuf::from("token.json"),
                drive_api_url: "https://www.googleapis.com".to_string(),
                drive_upload_url: "https://www.googleapis.com".to_string(),
                docs_api_url: "https://docs.googleapis.com".to_string(),
            },
            slack: SlackSettings {
                api_url: "https://slack.com/api".to_string(),
                bot_token: None,
            },
        }
    }
}

impl ServiceConfig {
    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "site-archiver", "site-archiver") {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        }
    }

    /// Path of the default configuration file
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("default.yaml")
    }

    /// Load the configuration from `path`, or from the default location when `None`.
    ///
    /// Environment overrides are applied on top of whatever was read from disk.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default()?,
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the default configuration
    fn load_default() -> Result<Self> {
        let config_path = Self::default_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            // Create and save the default configuration
            info!("Default configuration not found. Creating...");
            let config = Self::default();
            if let Err(e) = config.save_to_file(&config_path) {
                error!("Failed to save default configuration: {:#}", e);
            }
            Ok(config)
        }
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))
    }

    fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Override settings from the process environment
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("SLACK_BOT_TOKEN").filter(|t| !t.is_empty()) {
            self.slack.bot_token = Some(token);
        }

        if let Some(url) = lookup("WEBDRIVER_URL").filter(|u| !u.is_empty()) {
            self.browser.webdriver_url = url;
        }

        if let Some(file) = lookup("GOOGLE_TOKEN_FILE").filter(|f| !f.is_empty()) {
            self.google.token_file = PathBuf::from(file);
        }
    }

    /// Render the configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration")
    }

    /// Save the configuration to a file
    fn save_to_file(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        fs::write(path, self.to_yaml()?)
            .context(format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }
}
