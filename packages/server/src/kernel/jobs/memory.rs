//! In-process task broker.
//!
//! Same lease and expiry rules as [`PostgresTaskBroker`](super::PostgresTaskBroker),
//! kept in a map. Used when the server runs without a database (embedded worker)
//! and in tests.
//!
//! Finished tasks are dropped once they are older than the retention window,
//! after which polling them reports not found.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lemmatizer::WordToken;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::queue::{TaskBroker, HARD_LIMIT_MESSAGE};
use super::task::{ClaimedTask, TaskHandle, TaskState, TaskStatus};

#[derive(Debug)]
struct StoredTask {
    seq: u64,
    text: String,
    status: TaskStatus,
    result: Option<Vec<WordToken>>,
    error: Option<String>,
    worker_id: Option<String>,
    attempt: i32,
    started_at: Option<Instant>,
    lease_expires_at: Option<Instant>,
    finished_at: Option<Instant>,
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskHandle, StoredTask>,
    next_seq: u64,
}

/// How long a finished task stays pollable by default.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

pub struct InMemoryTaskBroker {
    inner: Mutex<Inner>,
    lease: Duration,
    retention: Duration,
}

impl InMemoryTaskBroker {
    pub fn new() -> Self {
        Self::with_lease_duration(Duration::from_secs(60))
    }

    pub fn with_lease_duration(lease: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            lease,
            retention: DEFAULT_RETENTION,
        }
    }

    /// Keep finished tasks for `retention` after they finish.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Worker currently holding the task, if any.
    pub async fn holder(&self, handle: TaskHandle) -> Option<String> {
        let inner = self.inner.lock().await;
        inner
            .tasks
            .get(&handle)
            .filter(|task| task.status == TaskStatus::Running)
            .and_then(|task| task.worker_id.clone())
    }
}

impl Default for InMemoryTaskBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl StoredTask {
    fn is_claimable(&self, now: Instant) -> bool {
        match self.status {
            TaskStatus::Pending => true,
            TaskStatus::Running => self.lease_expires_at.is_some_and(|lease| lease < now),
            TaskStatus::Succeeded | TaskStatus::Failed => false,
        }
    }

    fn finish(&mut self, status: TaskStatus) {
        self.status = status;
        self.lease_expires_at = None;
        self.finished_at = Some(Instant::now());
    }
}

impl Inner {
    /// Drop finished tasks older than `retention`.
    fn purge_finished(&mut self, now: Instant, retention: Duration) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| {
            task.finished_at
                .map_or(true, |finished| now.duration_since(finished) < retention)
        });
        before - self.tasks.len()
    }
}

#[async_trait]
impl TaskBroker for InMemoryTaskBroker {
    async fn submit(&self, text: String) -> Result<TaskHandle> {
        let handle = TaskHandle::new();
        let mut inner = self.inner.lock().await;
        inner.purge_finished(Instant::now(), self.retention);

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.tasks.insert(
            handle,
            StoredTask {
                seq,
                text,
                status: TaskStatus::Pending,
                result: None,
                error: None,
                worker_id: None,
                attempt: 0,
                started_at: None,
                lease_expires_at: None,
                finished_at: None,
            },
        );

        debug!(task_id = %handle, "task submitted");
        Ok(handle)
    }

    async fn status(&self, handle: TaskHandle) -> Result<Option<TaskState>> {
        let inner = self.inner.lock().await;

        Ok(inner.tasks.get(&handle).map(|task| match task.status {
            TaskStatus::Pending | TaskStatus::Running => TaskState::Pending,
            TaskStatus::Succeeded => TaskState::Completed(task.result.clone().unwrap_or_default()),
            TaskStatus::Failed => TaskState::Failed(
                task.error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
        }))
    }

    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedTask>> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        let mut candidates: Vec<(u64, TaskHandle)> = inner
            .tasks
            .iter()
            .filter(|(_, task)| task.is_claimable(now))
            .map(|(handle, task)| (task.seq, *handle))
            .collect();
        candidates.sort_unstable_by_key(|(seq, _)| *seq);
        candidates.truncate(limit.max(0) as usize);

        let mut claimed = Vec::with_capacity(candidates.len());
        for (_, handle) in candidates {
            if let Some(task) = inner.tasks.get_mut(&handle) {
                task.status = TaskStatus::Running;
                task.worker_id = Some(worker_id.to_string());
                task.attempt += 1;
                task.started_at.get_or_insert(now);
                task.lease_expires_at = Some(now + self.lease);

                claimed.push(ClaimedTask {
                    handle,
                    text: task.text.clone(),
                    attempt: task.attempt,
                });
            }
        }

        Ok(claimed)
    }

    async fn heartbeat(&self, handle: TaskHandle) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(task) = inner.tasks.get_mut(&handle) {
            if task.status == TaskStatus::Running {
                task.lease_expires_at = Some(Instant::now() + self.lease);
            }
        }
        Ok(())
    }

    async fn complete(&self, handle: TaskHandle, tokens: &[WordToken]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(task) = inner.tasks.get_mut(&handle) {
            if task.status == TaskStatus::Running {
                task.result = Some(tokens.to_vec());
                task.finish(TaskStatus::Succeeded);
            }
        }
        Ok(())
    }

    async fn fail(&self, handle: TaskHandle, error: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(task) = inner.tasks.get_mut(&handle) {
            if task.status == TaskStatus::Running {
                task.error = Some(error.to_string());
                task.finish(TaskStatus::Failed);
            }
        }
        Ok(())
    }

    async fn expire_overdue(&self, hard_limit: Duration) -> Result<u64> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        let mut expired = 0;
        for task in inner.tasks.values_mut() {
            let overdue = task
                .started_at
                .is_some_and(|started| now.duration_since(started) > hard_limit);
            if task.status == TaskStatus::Running && overdue {
                task.error = Some(HARD_LIMIT_MESSAGE.to_string());
                task.finish(TaskStatus::Failed);
                expired += 1;
            }
        }

        if expired > 0 {
            info!(expired, "expired tasks past the hard time limit");
        }

        let purged = inner.purge_finished(now, self.retention);
        if purged > 0 {
            debug!(purged, "dropped finished tasks past retention");
        }

        Ok(expired)
    }
}
