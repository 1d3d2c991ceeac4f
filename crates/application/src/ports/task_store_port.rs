//! Task store port
//!
//! Keeps A2A tasks between requests of the same conversation.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use protocol_a2a::Task;

use crate::error::ApplicationError;

/// Port for task persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TaskStorePort: Send + Sync {
    /// Insert or replace a task
    async fn save(&self, task: Task) -> Result<(), ApplicationError>;

    /// Fetch a task by id
    async fn get(&self, task_id: &str) -> Result<Option<Task>, ApplicationError>;

    /// Remove a task, returning whether it existed
    async fn delete(&self, task_id: &str) -> Result<bool, ApplicationError>;

    /// All tasks of a context, oldest status first
    async fn list_by_context(&self, context_id: &str) -> Result<Vec<Task>, ApplicationError>;
}
