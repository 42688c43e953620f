use axum::{extract::Extension, Json};

use crate::common::{AppJson, AppPath, AppResult};
use crate::domains::analysis::actions;
use crate::domains::analysis::{
    AnalysisResponse, AnalysisTaskIds, AnalyzeTextRequest, SubmitAnalysisResponse,
    TaskStatusResponse,
};
use crate::kernel::jobs::TaskHandle;
use crate::server::app::AxumAppState;

/// `POST /analyze-text`: analyse both texts in-process.
pub async fn analyze_text_handler(
    Extension(state): Extension<AxumAppState>,
    AppJson(request): AppJson<AnalyzeTextRequest>,
) -> AppResult<Json<AnalysisResponse>> {
    let analysis = actions::analyze(
        &state.server_deps.extractor,
        request.original_text,
        request.summary_text,
    )
    .await?;

    Ok(Json(AnalysisResponse { analysis }))
}

/// `POST /analyze-text-async`: queue one extraction task per text.
pub async fn analyze_text_async_handler(
    Extension(state): Extension<AxumAppState>,
    AppJson(request): AppJson<AnalyzeTextRequest>,
) -> AppResult<Json<SubmitAnalysisResponse>> {
    let task_ids = actions::submit_analysis(state.server_deps.tasks.as_ref(), request).await?;
    Ok(Json(SubmitAnalysisResponse { task_ids }))
}

pub async fn task_status_handler(
    Extension(state): Extension<AxumAppState>,
    AppPath(task_id): AppPath<TaskHandle>,
) -> AppResult<Json<TaskStatusResponse>> {
    let task_state = actions::poll(state.server_deps.tasks.as_ref(), task_id).await?;
    Ok(Json(task_state.into()))
}

/// `POST /analyze-text-results`: combine two finished tasks.
///
/// Answers 202 while either task is still pending.
pub async fn analyze_text_results_handler(
    Extension(state): Extension<AxumAppState>,
    AppJson(task_ids): AppJson<AnalysisTaskIds>,
) -> AppResult<Json<AnalysisResponse>> {
    let analysis = actions::aggregate(state.server_deps.tasks.as_ref(), task_ids).await?;
    Ok(Json(AnalysisResponse { analysis }))
}
