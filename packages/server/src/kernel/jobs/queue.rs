//! Task broker trait and the PostgreSQL-backed implementation.
//!
//! One table (`analysis_tasks`) serves as both queue and result backend.
//! Completion is acknowledged only after the extractor returns, so a task held
//! by a worker that died is claimable again once its lease runs out.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lemmatizer::WordToken;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::task::{ClaimedTask, TaskHandle, TaskState, TaskStatus};

/// Error message recorded for tasks swept by [`TaskBroker::expire_overdue`].
pub const HARD_LIMIT_MESSAGE: &str = "hard time limit exceeded";

/// Queue plus result backend for extraction tasks.
#[async_trait]
pub trait TaskBroker: Send + Sync {
    /// Enqueue `text` for extraction.
    async fn submit(&self, text: String) -> Result<TaskHandle>;

    /// Current state of a task, or `None` if the handle is unknown.
    ///
    /// Never waits for the task to finish.
    async fn status(&self, handle: TaskHandle) -> Result<Option<TaskState>>;

    /// Claim up to `limit` tasks for `worker_id`, oldest first.
    ///
    /// Includes running tasks whose lease has expired.
    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedTask>>;

    /// Extend the lease of a running task.
    async fn heartbeat(&self, handle: TaskHandle) -> Result<()>;

    /// Store the result of a running task.
    async fn complete(&self, handle: TaskHandle, tokens: &[WordToken]) -> Result<()>;

    /// Record a running task as failed.
    async fn fail(&self, handle: TaskHandle, error: &str) -> Result<()>;

    /// Fail every running task started more than `hard_limit` ago.
    ///
    /// Returns how many tasks were expired.
    async fn expire_overdue(&self, hard_limit: Duration) -> Result<u64>;
}

/// PostgreSQL-backed task broker.
pub struct PostgresTaskBroker {
    pool: PgPool,
    lease_ms: i64,
}

impl PostgresTaskBroker {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lease_ms: 60_000, // 1 minute
        }
    }
}

#[async_trait]
impl TaskBroker for PostgresTaskBroker {
    async fn submit(&self, text: String) -> Result<TaskHandle> {
        let handle = TaskHandle::new();

        sqlx::query(
            r#"
            INSERT INTO analysis_tasks (id, status, payload)
            VALUES ($1, 'pending', $2)
            "#,
        )
        .bind(handle.as_uuid())
        .bind(&text)
        .execute(&self.pool)
        .await
        .context("failed to insert analysis task")?;

        debug!(task_id = %handle, text_len = text.len(), "task submitted");
        Ok(handle)
    }

    async fn status(&self, handle: TaskHandle) -> Result<Option<TaskState>> {
        let row = sqlx::query_as::<_, (TaskStatus, Option<serde_json::Value>, Option<String>)>(
            r#"
            SELECT status, result, error_message
            FROM analysis_tasks
            WHERE id = $1
            "#,
        )
        .bind(handle.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some((status, result, error_message)) = row else {
            return Ok(None);
        };

        let state = match status {
            TaskStatus::Pending | TaskStatus::Running => TaskState::Pending,
            TaskStatus::Succeeded => {
                let tokens: Vec<WordToken> = match result {
                    Some(value) => serde_json::from_value(value)
                        .with_context(|| format!("task {} has an unreadable result", handle))?,
                    None => Vec::new(),
                };
                TaskState::Completed(tokens)
            }
            TaskStatus::Failed => {
                TaskState::Failed(error_message.unwrap_or_else(|| "unknown error".to_string()))
            }
        };

        Ok(Some(state))
    }

    async fn claim(&self, worker_id: &str, limit: i64) -> Result<Vec<ClaimedTask>> {
        let rows = sqlx::query_as::<_, (Uuid, String, i32)>(
            r#"
            WITH next_tasks AS (
                SELECT id
                FROM analysis_tasks
                WHERE status = 'pending'
                   OR (status = 'running' AND lease_expires_at < NOW())
                ORDER BY created_at
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE analysis_tasks t
            SET status = 'running',
                worker_id = $2,
                attempt = t.attempt + 1,
                started_at = COALESCE(t.started_at, NOW()),
                lease_expires_at = NOW() + ($3 || ' milliseconds')::INTERVAL,
                updated_at = NOW()
            FROM next_tasks
            WHERE t.id = next_tasks.id
            RETURNING t.id, t.payload, t.attempt
            "#,
        )
        .bind(limit)
        .bind(worker_id)
        .bind(self.lease_ms.to_string())
        .fetch_all(&self.pool)
        .await
        .context("failed to claim analysis tasks")?;

        Ok(rows
            .into_iter()
            .map(|(id, text, attempt)| ClaimedTask {
                handle: TaskHandle::from_uuid(id),
                text,
                attempt,
            })
            .collect())
    }

    async fn heartbeat(&self, handle: TaskHandle) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE analysis_tasks
            SET lease_expires_at = NOW() + ($1 || ' milliseconds')::INTERVAL,
                updated_at = NOW()
            WHERE id = $2 AND status = 'running'
            "#,
        )
        .bind(self.lease_ms.to_string())
        .bind(handle.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn complete(&self, handle: TaskHandle, tokens: &[WordToken]) -> Result<()> {
        let result = serde_json::to_value(tokens)?;

        sqlx::query(
            r#"
            UPDATE analysis_tasks
            SET status = 'succeeded',
                result = $1,
                lease_expires_at = NULL,
                finished_at = NOW(),
                updated_at = NOW()
            WHERE id = $2 AND status = 'running'
            "#,
        )
        .bind(result)
        .bind(handle.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fail(&self, handle: TaskHandle, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE analysis_tasks
            SET status = 'failed',
                error_message = $1,
                lease_expires_at = NULL,
                finished_at = NOW(),
                updated_at = NOW()
            WHERE id = $2 AND status = 'running'
            "#,
        )
        .bind(error)
        .bind(handle.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn expire_overdue(&self, hard_limit: Duration) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE analysis_tasks
            SET status = 'failed',
                error_message = $1,
                lease_expires_at = NULL,
                finished_at = NOW(),
                updated_at = NOW()
            WHERE status = 'running'
              AND started_at < NOW() - ($2 || ' milliseconds')::INTERVAL
            "#,
        )
        .bind(HARD_LIMIT_MESSAGE)
        .bind(hard_limit.as_millis().to_string())
        .execute(&self.pool)
        .await?;

        let expired = result.rows_affected();
        if expired > 0 {
            info!(expired, "expired tasks past the hard time limit");
        }
        Ok(expired)
    }
}
