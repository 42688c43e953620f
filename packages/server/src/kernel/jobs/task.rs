//! Task identity, lifecycle status and the view callers poll.

use std::fmt;
use std::str::FromStr;

use lemmatizer::WordToken;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a submitted extraction task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(Uuid);

impl TaskHandle {
    /// Time-ordered id, so claim order follows submission order.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskHandle {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Stored task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "analysis_task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// What a poller sees. Running tasks are reported as pending.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    Completed(Vec<WordToken>),
    Failed(String),
}

impl TaskState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskState::Pending)
    }
}

/// A task handed to a worker by `claim`.
#[derive(Debug, Clone)]
pub struct ClaimedTask {
    pub handle: TaskHandle,
    pub text: String,
    /// 1 on first delivery, higher when redelivered after a lost lease
    pub attempt: i32,
}
