use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle state of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl TaskStatus {
    /// `completed` and `error` are final
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }

    /// Allowed moves: queued -> processing | error, processing -> completed | error
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        matches!(
            (self, next),
            (TaskStatus::Queued, TaskStatus::Processing)
                | (TaskStatus::Queued, TaskStatus::Error)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Error)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// One tracked crawl request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, fixed at submission
    pub task_id: String,

    /// Normalized seed URL
    pub seed_url: String,

    pub status: TaskStatus,

    /// Human-readable progress, result or error description
    pub message: String,

    /// References to archived pages, only set once the crawl completed
    pub data: Option<Vec<String>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A freshly submitted task
    pub fn queued(task_id: String, seed_url: String) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            seed_url,
            status: TaskStatus::Queued,
            message: "task queued".to_string(),
            data: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A state change applied to a task as one unit
#[derive(Debug, Clone, PartialEq)]
pub enum TaskUpdate {
    Processing { message: String },
    Completed { message: String, data: Vec<String> },
    Failed { message: String },
}

impl TaskUpdate {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskUpdate::Processing { .. } => TaskStatus::Processing,
            TaskUpdate::Completed { .. } => TaskStatus::Completed,
            TaskUpdate::Failed { .. } => TaskStatus::Error,
        }
    }
}
