pub mod docs;
pub mod slack;

// Re-export common types
pub use docs::DocsClient;
pub use slack::{SlackClient, SlackError};
