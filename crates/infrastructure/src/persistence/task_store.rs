//! In-memory task store implementation
//!
//! Implements the TaskStorePort on a moka cache, so a long-running agent
//! keeps a bounded number of tasks and forgets idle ones.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use application::{error::ApplicationError, ports::TaskStorePort};
use async_trait::async_trait;
use moka::{future::Cache, policy::EvictionPolicy};
use protocol_a2a::Task;
use tracing::{debug, instrument};

const DEFAULT_MAX_TASKS: u64 = 10_000;
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Task store backed by a bounded TTL cache
///
/// Tasks keep the sequence number of their first save, so a context lists
/// its tasks in creation order even when later tasks finish first. When
/// full, the least recently used task is evicted.
#[derive(Debug)]
pub struct InMemoryTaskStore {
    tasks: Cache<String, (u64, Task)>,
    next_seq: AtomicU64,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_TASKS, DEFAULT_TTL)
    }
}

impl InMemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding at most `max_tasks`, each for `ttl` after its last save
    #[must_use]
    pub fn with_limits(max_tasks: u64, ttl: Duration) -> Self {
        Self {
            tasks: Cache::builder()
                .max_capacity(max_tasks)
                .time_to_live(ttl)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of stored tasks, after pending evictions have run
    pub async fn len(&self) -> u64 {
        self.tasks.run_pending_tasks().await;
        self.tasks.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TaskStorePort for InMemoryTaskStore {
    #[instrument(skip(self, task), fields(task_id = %task.id, state = ?task.status.state))]
    async fn save(&self, task: Task) -> Result<(), ApplicationError> {
        let next_seq = &self.next_seq;
        self.tasks
            .entry(task.id.clone())
            .and_upsert_with(|existing| {
                let seq = existing.map_or_else(
                    || next_seq.fetch_add(1, Ordering::Relaxed) + 1,
                    |entry| entry.value().0,
                );
                std::future::ready((seq, task))
            })
            .await;
        debug!("Saved task");
        Ok(())
    }

    async fn get(&self, task_id: &str) -> Result<Option<Task>, ApplicationError> {
        Ok(self.tasks.get(task_id).await.map(|(_, task)| task))
    }

    #[instrument(skip(self))]
    async fn delete(&self, task_id: &str) -> Result<bool, ApplicationError> {
        Ok(self.tasks.remove(task_id).await.is_some())
    }

    async fn list_by_context(&self, context_id: &str) -> Result<Vec<Task>, ApplicationError> {
        let mut found: Vec<(u64, Task)> = self
            .tasks
            .iter()
            .map(|(_, entry)| entry)
            .filter(|(_, task)| task.context_id == context_id)
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found.into_iter().map(|(_, task)| task).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use protocol_a2a::{TaskState, TaskStatus};

    use super::*;

    fn task(id: &str, context_id: &str) -> Task {
        Task {
            id: id.to_string(),
            context_id: context_id.to_string(),
            status: TaskStatus::new(TaskState::Submitted, None),
            artifacts: Vec::new(),
            history: Vec::new(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn save_get_delete() {
        let store = InMemoryTaskStore::new();
        store.save(task("t1", "c1")).await.unwrap();
        assert_eq!(store.get("t1").await.unwrap().unwrap().context_id, "c1");
        assert!(store.get("t2").await.unwrap().is_none());

        assert!(store.delete("t1").await.unwrap());
        assert!(!store.delete("t1").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn save_replaces_task() {
        let store = InMemoryTaskStore::new();
        store.save(task("t1", "c1")).await.unwrap();

        let mut updated = task("t1", "c1");
        updated.status = TaskStatus::new(TaskState::Completed, None);
        store.save(updated).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get("t1").await.unwrap().unwrap().status.state,
            TaskState::Completed
        );
    }

    #[tokio::test]
    async fn context_lists_in_creation_order() {
        let store = InMemoryTaskStore::new();
        store.save(task("first", "c1")).await.unwrap();
        store.save(task("other", "c2")).await.unwrap();
        store.save(task("second", "c1")).await.unwrap();
        // updating the first task keeps its position
        store.save(task("first", "c1")).await.unwrap();

        let ids: Vec<String> = store
            .list_by_context("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
        assert!(store.list_by_context("none").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn idle_tasks_expire() {
        let store = InMemoryTaskStore::with_limits(100, Duration::from_millis(50));
        store.save(task("t1", "c1")).await.unwrap();
        assert!(store.get("t1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.get("t1").await.unwrap().is_none());
        assert!(store.list_by_context("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oldest_task_is_evicted_when_full() {
        let store = InMemoryTaskStore::with_limits(2, DEFAULT_TTL);
        for id in ["t1", "t2", "t3"] {
            store.save(task(id, "c1")).await.unwrap();
            store.tasks.run_pending_tasks().await;
        }

        assert_eq!(store.len().await, 2);
        assert!(store.get("t1").await.unwrap().is_none());
        assert!(store.get("t3").await.unwrap().is_some());
    }
}
