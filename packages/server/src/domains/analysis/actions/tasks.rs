//! Asynchronous fidelity analysis over the task broker.

use tracing::{debug, info};

use crate::common::{AppError, AppResult};
use crate::domains::analysis::index::{annotate, FuzzyLemmaPool};
use crate::domains::analysis::models::{AnalysisEntry, AnalysisTaskIds, AnalyzeTextRequest};
use crate::kernel::jobs::{TaskBroker, TaskHandle, TaskState};

/// Queue independent extraction tasks for the original and the summary.
pub async fn submit_analysis(
    tasks: &dyn TaskBroker,
    request: AnalyzeTextRequest,
) -> AppResult<AnalysisTaskIds> {
    let original_text = tasks.submit(request.original_text).await?;
    let summary_text = tasks.submit(request.summary_text).await?;

    info!(
        original_task = %original_text,
        summary_task = %summary_text,
        "analysis tasks submitted"
    );

    Ok(AnalysisTaskIds {
        original_text,
        summary_text,
    })
}

/// Current state of one task. Never waits.
pub async fn poll(tasks: &dyn TaskBroker, handle: TaskHandle) -> AppResult<TaskState> {
    let state = tasks
        .status(handle)
        .await?
        .ok_or(AppError::TaskNotFound(handle))?;

    debug!(task_id = %handle, pending = state.is_pending(), "task polled");
    Ok(state)
}

/// Combine two finished tasks into an analysis.
///
/// A summary lemma counts as found when it approximately matches any lemma of
/// the original. A failed task is reported before a pending one.
pub async fn aggregate(
    tasks: &dyn TaskBroker,
    ids: AnalysisTaskIds,
) -> AppResult<Vec<AnalysisEntry>> {
    let original = poll(tasks, ids.original_text).await?;
    let summary = poll(tasks, ids.summary_text).await?;

    let (original, summary) = match (original, summary) {
        (TaskState::Failed(reason), _) => {
            return Err(AppError::TaskFailed {
                handle: ids.original_text,
                reason,
            })
        }
        (_, TaskState::Failed(reason)) => {
            return Err(AppError::TaskFailed {
                handle: ids.summary_text,
                reason,
            })
        }
        (TaskState::Completed(original), TaskState::Completed(summary)) => (original, summary),
        _ => return Err(AppError::TasksPending),
    };

    let pool = FuzzyLemmaPool::from_tokens(&original);
    Ok(annotate(summary, &pool))
}
