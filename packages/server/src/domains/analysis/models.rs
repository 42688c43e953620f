//! Analysis request/response types.

use lemmatizer::{Upos, WordToken};
use serde::{Deserialize, Serialize};

use crate::kernel::jobs::{TaskHandle, TaskState};

/// Body of `/analyze-text` and `/analyze-text-async`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeTextRequest {
    pub original_text: String,
    pub summary_text: String,
}

/// One summary token and whether its lemma occurs in the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub word: String,
    pub lemma: String,
    pub pos: Upos,
    pub found_in_original: bool,
}

impl AnalysisEntry {
    pub fn new(token: WordToken, found_in_original: bool) -> Self {
        Self {
            word: token.text,
            lemma: token.lemma,
            pos: token.pos,
            found_in_original,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis: Vec<AnalysisEntry>,
}

/// The pair of tasks backing one asynchronous analysis.
///
/// Also the body of `/analyze-text-results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTaskIds {
    pub original_text: TaskHandle,
    pub summary_text: TaskHandle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnalysisResponse {
    pub task_ids: AnalysisTaskIds,
}

/// Wire form of a task poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatusResponse {
    Pending,
    Completed { result: Vec<WordToken> },
    Failed { error: String },
}

impl From<TaskState> for TaskStatusResponse {
    fn from(state: TaskState) -> Self {
        match state {
            TaskState::Pending => TaskStatusResponse::Pending,
            TaskState::Completed(result) => TaskStatusResponse::Completed { result },
            TaskState::Failed(error) => TaskStatusResponse::Failed { error },
        }
    }
}
