//! Task infrastructure for asynchronous lemma extraction.
//!
//! This module provides the kernel-level pieces; the analysis domain decides
//! what to submit and how to combine results.
//! - [`TaskBroker`] - Queue + result backend seam
//! - [`PostgresTaskBroker`] - Database-backed broker
//! - [`InMemoryTaskBroker`] - Process-local broker for embedded mode and tests
//! - [`TaskWorker`] - Long-running service that claims and executes tasks
//!
//! # Architecture
//!
//! ```text
//! POST /analyze-text-async
//!     │
//!     └─► TaskBroker.submit(text) ──► analysis_tasks (pending)
//!
//! TaskWorker (worker binary or embedded)
//!     │
//!     ├─► claim ──► running, leased
//!     ├─► LemmaExtractor.extract(text)
//!     └─► complete / fail
//!
//! GET /task-status/:id ──► TaskBroker.status(handle)
//! ```

mod memory;
mod queue;
mod task;
mod worker;

pub use memory::InMemoryTaskBroker;
pub use queue::{PostgresTaskBroker, TaskBroker, HARD_LIMIT_MESSAGE};
pub use task::{ClaimedTask, TaskHandle, TaskState, TaskStatus};
pub use worker::{RunawayPolicy, TaskWorker, TaskWorkerConfig, SOFT_LIMIT_MESSAGE};
