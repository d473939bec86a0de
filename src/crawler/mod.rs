pub mod controller;
pub mod page;
pub mod registry;
pub mod scheduler;
pub mod task;
pub mod worker;

// Re-export common types
pub use controller::{CrawlerController, ScrapeRequest};
