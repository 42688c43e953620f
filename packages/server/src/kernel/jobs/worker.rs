//! Task worker service for background lemma extraction.
//!
//! The `TaskWorker` is a long-running service that:
//! - Sweeps tasks that outlived the hard time limit
//! - Claims up to `prefetch` tasks from the broker
//! - Heartbeats the lease of every claimed task until that task is finished
//! - Runs the extractor on a blocking thread
//! - Records the result, or a failure when the soft time limit passes
//!
//! # Architecture
//!
//! ```text
//! TaskWorker
//!     │
//!     ├─► expire_overdue(hard_limit)
//!     ├─► claim(worker_id, prefetch)          ◄── heartbeat each claimed task
//!     ├─► spawn_blocking(extractor.extract)
//!     │       └─► bounded by soft_time_limit
//!     └─► complete / fail
//! ```
//!
//! A computation still running at the hard limit cannot be interrupted. What
//! happens next is decided by [`RunawayPolicy`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use lemmatizer::LemmaExtractor;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::queue::TaskBroker;
use super::task::{ClaimedTask, TaskHandle};

/// Error recorded when a task exceeds the soft time limit.
pub const SOFT_LIMIT_MESSAGE: &str = "soft time limit exceeded";

/// What the worker does when a computation outlives the hard time limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunawayPolicy {
    /// Return an error from [`TaskWorker::run`] so a supervisor can restart
    /// the process and reclaim the stuck thread.
    #[default]
    Exit,
    /// Detach the stuck thread and keep serving the queue. The thread runs
    /// to completion in the background and its result is discarded.
    Abandon,
}

/// Configuration for the task worker.
#[derive(Debug, Clone)]
pub struct TaskWorkerConfig {
    /// Maximum number of tasks claimed per poll
    pub prefetch: i64,
    /// How long to wait when no tasks are available
    pub poll_interval: Duration,
    /// How often to extend the lease of each claimed task
    pub heartbeat_interval: Duration,
    pub soft_time_limit: Duration,
    pub hard_time_limit: Duration,
    pub on_runaway: RunawayPolicy,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for TaskWorkerConfig {
    fn default() -> Self {
        Self {
            prefetch: 1,
            poll_interval: Duration::from_millis(500),
            heartbeat_interval: Duration::from_secs(20),
            soft_time_limit: Duration::from_secs(540),
            hard_time_limit: Duration::from_secs(600),
            on_runaway: RunawayPolicy::Exit,
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl TaskWorkerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// Background service that executes extraction tasks.
pub struct TaskWorker {
    broker: Arc<dyn TaskBroker>,
    extractor: LemmaExtractor,
    config: TaskWorkerConfig,
}

impl TaskWorker {
    pub fn with_config(
        broker: Arc<dyn TaskBroker>,
        extractor: LemmaExtractor,
        config: TaskWorkerConfig,
    ) -> Self {
        Self {
            broker,
            extractor,
            config,
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// The claimed batch is always finished before the loop exits. Returns an
    /// error only when a computation outlives the hard time limit under
    /// [`RunawayPolicy::Exit`].
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            prefetch = self.config.prefetch,
            soft_limit_secs = self.config.soft_time_limit.as_secs(),
            hard_limit_secs = self.config.hard_time_limit.as_secs(),
            "task worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            if let Err(e) = self.broker.expire_overdue(self.config.hard_time_limit).await {
                error!(error = %e, "failed to expire overdue tasks");
            }

            let tasks = match self
                .broker
                .claim(&self.config.worker_id, self.config.prefetch)
                .await
            {
                Ok(tasks) => tasks,
                Err(e) => {
                    error!(error = %e, "failed to claim tasks");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    }
                    continue;
                }
            };

            if tasks.is_empty() {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
                continue;
            }

            debug!(count = tasks.len(), "claimed tasks");

            // Leases of tasks still waiting in the batch must not lapse.
            let heartbeats: Vec<DropGuard> = tasks
                .iter()
                .map(|task| self.spawn_heartbeat(task.handle).drop_guard())
                .collect();

            for (task, heartbeat) in tasks.into_iter().zip(heartbeats) {
                let outcome = self.process(task).await;
                drop(heartbeat);
                outcome?;
            }
        }

        info!(worker_id = %self.config.worker_id, "task worker stopped");
        Ok(())
    }

    /// Run until a shutdown signal is received.
    ///
    /// Convenience method that listens for Ctrl+C.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = CancellationToken::new();

        let signal = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
            signal.cancel();
        });

        self.run(shutdown).await
    }

    async fn process(&self, task: ClaimedTask) -> Result<()> {
        let handle = task.handle;
        debug!(task_id = %handle, attempt = task.attempt, "executing task");

        let extractor = self.extractor.clone();
        let text = task.text;
        let mut extraction = tokio::task::spawn_blocking(move || extractor.extract(&text));

        let outcome = tokio::time::timeout(self.config.soft_time_limit, &mut extraction).await;

        match outcome {
            Ok(Ok(Ok(tokens))) => {
                info!(task_id = %handle, tokens = tokens.len(), "task succeeded");
                if let Err(e) = self.broker.complete(handle, &tokens).await {
                    error!(task_id = %handle, error = %e, "failed to store task result");
                }
            }
            Ok(Ok(Err(e))) => {
                warn!(task_id = %handle, error = %e, "task failed");
                self.record_failure(handle, &e.to_string()).await;
            }
            Ok(Err(join_error)) => {
                error!(task_id = %handle, error = %join_error, "task panicked");
                self.record_failure(handle, &format!("extraction panicked: {}", join_error))
                    .await;
            }
            Err(_) => {
                warn!(task_id = %handle, "task exceeded soft time limit");
                self.record_failure(handle, SOFT_LIMIT_MESSAGE).await;

                let grace = self
                    .config
                    .hard_time_limit
                    .saturating_sub(self.config.soft_time_limit);
                if tokio::time::timeout(grace, extraction).await.is_err() {
                    match self.config.on_runaway {
                        RunawayPolicy::Exit => {
                            error!(task_id = %handle, "task exceeded hard time limit");
                            return Err(anyhow!(
                                "task {} still running past the hard time limit",
                                handle
                            ));
                        }
                        RunawayPolicy::Abandon => {
                            error!(
                                task_id = %handle,
                                "task exceeded hard time limit, abandoning its thread"
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn record_failure(&self, handle: TaskHandle, reason: &str) {
        if let Err(e) = self.broker.fail(handle, reason).await {
            error!(task_id = %handle, error = %e, "failed to mark task as failed");
        }
    }

    /// Extend the lease every `heartbeat_interval` until the returned token is cancelled.
    fn spawn_heartbeat(&self, handle: TaskHandle) -> CancellationToken {
        let cancel = CancellationToken::new();
        let broker = self.broker.clone();
        let interval = self.config.heartbeat_interval;

        let stop = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // Skip first immediate tick

            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = broker.heartbeat(handle).await {
                            warn!(task_id = %handle, error = %e, "heartbeat failed");
                        }
                    }
                }
            }
        });

        cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::jobs::{InMemoryTaskBroker, TaskState};
    use lemmatizer::testing::{extractor_with, FailingPipeline, SlowPipeline};
    use lemmatizer::Upos;

    fn config(soft_ms: u64, hard_ms: u64) -> TaskWorkerConfig {
        TaskWorkerConfig {
            poll_interval: Duration::from_millis(10),
            heartbeat_interval: Duration::from_millis(10),
            soft_time_limit: Duration::from_millis(soft_ms),
            hard_time_limit: Duration::from_millis(hard_ms),
            ..TaskWorkerConfig::with_worker_id("test-worker")
        }
    }

    async fn wait_for_terminal(broker: &InMemoryTaskBroker, handle: TaskHandle) -> TaskState {
        for _ in 0..200 {
            match broker.status(handle).await.unwrap() {
                Some(TaskState::Pending) => tokio::time::sleep(Duration::from_millis(10)).await,
                Some(state) => return state,
                None => panic!("task vanished"),
            }
        }
        panic!("task {} never finished", handle);
    }

    #[test]
    fn test_config_defaults() {
        let config = TaskWorkerConfig::default();
        assert_eq!(config.prefetch, 1);
        assert_eq!(config.soft_time_limit, Duration::from_secs(540));
        assert_eq!(config.hard_time_limit, Duration::from_secs(600));
        assert_eq!(config.on_runaway, RunawayPolicy::Exit);
        assert!(config.worker_id.starts_with("worker-"));
    }

    #[tokio::test]
    async fn test_worker_completes_task_and_stops_on_shutdown() {
        let broker = Arc::new(InMemoryTaskBroker::new());
        let extractor = extractor_with([("hiša", "hiša", Upos::Noun)]);
        let worker = TaskWorker::with_config(broker.clone(), extractor, config(1_000, 2_000));

        let shutdown = CancellationToken::new();
        let running = tokio::spawn(worker.run(shutdown.clone()));

        let handle = broker.submit("Hiša.".into()).await.unwrap();
        match wait_for_terminal(&broker, handle).await {
            TaskState::Completed(tokens) => {
                assert_eq!(tokens.len(), 1);
                assert_eq!(tokens[0].lemma, "hiša");
            }
            other => panic!("unexpected state {:?}", other),
        }

        shutdown.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_pipeline_error_fails_task() {
        let broker = Arc::new(InMemoryTaskBroker::new());
        let extractor = LemmaExtractor::new(FailingPipeline::new("lexicon exploded"));
        let worker = TaskWorker::with_config(broker.clone(), extractor, config(1_000, 2_000));

        let shutdown = CancellationToken::new();
        let running = tokio::spawn(worker.run(shutdown.clone()));

        let handle = broker.submit("x".into()).await.unwrap();
        match wait_for_terminal(&broker, handle).await {
            TaskState::Failed(reason) => assert!(reason.contains("lexicon exploded")),
            other => panic!("unexpected state {:?}", other),
        }

        shutdown.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_soft_limit_fails_task_but_worker_survives() {
        let broker = Arc::new(InMemoryTaskBroker::new());
        let extractor = LemmaExtractor::new(SlowPipeline::new(Duration::from_millis(100)));
        let worker = TaskWorker::with_config(broker.clone(), extractor, config(20, 1_000));

        let shutdown = CancellationToken::new();
        let running = tokio::spawn(worker.run(shutdown.clone()));

        let handle = broker.submit("x".into()).await.unwrap();
        assert_eq!(
            wait_for_terminal(&broker, handle).await,
            TaskState::Failed(SOFT_LIMIT_MESSAGE.into())
        );

        shutdown.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_runaway_task_stops_worker() {
        let broker = Arc::new(InMemoryTaskBroker::new());
        let extractor = LemmaExtractor::new(SlowPipeline::new(Duration::from_millis(300)));
        let worker = TaskWorker::with_config(broker.clone(), extractor, config(20, 60));

        let handle = broker.submit("x".into()).await.unwrap();
        let result = worker.run(CancellationToken::new()).await;

        assert!(result.is_err());
        assert_eq!(
            broker.status(handle).await.unwrap(),
            Some(TaskState::Failed(SOFT_LIMIT_MESSAGE.into()))
        );
    }

    #[tokio::test]
    async fn test_abandoned_runaway_keeps_worker_serving() {
        let broker = Arc::new(InMemoryTaskBroker::new());
        let extractor = LemmaExtractor::new(SlowPipeline::on("stuck", Duration::from_millis(300)));
        let worker = TaskWorker::with_config(
            broker.clone(),
            extractor,
            TaskWorkerConfig {
                on_runaway: RunawayPolicy::Abandon,
                ..config(20, 60)
            },
        );

        let stuck = broker.submit("stuck".into()).await.unwrap();
        let next = broker.submit("Hiša.".into()).await.unwrap();

        let shutdown = CancellationToken::new();
        let running = tokio::spawn(worker.run(shutdown.clone()));

        assert_eq!(
            wait_for_terminal(&broker, stuck).await,
            TaskState::Failed(SOFT_LIMIT_MESSAGE.into())
        );
        assert_eq!(
            wait_for_terminal(&broker, next).await,
            TaskState::Completed(vec![])
        );
        assert!(!running.is_finished());

        shutdown.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_batched_tasks_keep_their_leases_while_waiting() {
        let broker = Arc::new(InMemoryTaskBroker::with_lease_duration(Duration::from_millis(40)));
        let extractor = LemmaExtractor::new(SlowPipeline::on("slow", Duration::from_millis(150)));
        let worker = TaskWorker::with_config(
            broker.clone(),
            extractor,
            TaskWorkerConfig {
                prefetch: 2,
                ..config(1_000, 2_000)
            },
        );

        let first = broker.submit("slow".into()).await.unwrap();
        let second = broker.submit("fast".into()).await.unwrap();

        let shutdown = CancellationToken::new();
        let running = tokio::spawn(worker.run(shutdown.clone()));

        // Both tasks are claimed together; the second waits behind the first
        // for longer than one lease.
        tokio::time::sleep(Duration::from_millis(80)).await;
        let stolen = broker.claim("other-worker", 5).await.unwrap();
        assert!(stolen.is_empty(), "lease lapsed for {:?}", stolen);

        assert_eq!(
            wait_for_terminal(&broker, first).await,
            TaskState::Completed(vec![])
        );
        assert_eq!(
            wait_for_terminal(&broker, second).await,
            TaskState::Completed(vec![])
        );

        shutdown.cancel();
        running.await.unwrap().unwrap();
    }
}
