use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::crawler::task::{Task, TaskStatus, TaskUpdate};

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("invalid task transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}

/// In-memory map of every task submitted during this process' lifetime.
///
/// Tasks are never evicted. Each update replaces status, message and data under a
/// single write lock, so readers never see a half-applied transition.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and insert a `queued` task for it
    pub async fn create(&self, seed_url: &str) -> String {
        let mut tasks = self.tasks.write().await;

        let mut task_id = Uuid::new_v4().to_string();
        while tasks.contains_key(&task_id) {
            task_id = Uuid::new_v4().to_string();
        }

        tasks.insert(task_id.clone(), Task::queued(task_id.clone(), seed_url.to_string()));
        debug!("Registered task {} for {}", task_id, seed_url);

        task_id
    }

    /// Point-in-time copy of a task
    pub async fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Apply a state transition
    pub async fn update(&self, task_id: &str, update: TaskUpdate) -> Result<(), RegistryError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(task_id)
            .ok_or_else(|| RegistryError::NotFound(task_id.to_string()))?;

        let next = update.status();
        if !task.status.can_transition_to(next) {
            return Err(RegistryError::InvalidTransition { from: task.status, to: next });
        }

        match update {
            TaskUpdate::Processing { message } | TaskUpdate::Failed { message } => {
                task.message = message;
            }
            TaskUpdate::Completed { message, data } => {
                task.message = message;
                task.data = Some(data);
            }
        }
        task.status = next;
        task.updated_at = Utc::now();

        Ok(())
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }
}
