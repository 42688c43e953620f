//! Synchronous fidelity analysis.

use std::time::Instant;

use lemmatizer::LemmaExtractor;
use tracing::info;

use crate::common::{AppError, AppResult};
use crate::domains::analysis::index::{annotate, ExactLemmaSet};
use crate::domains::analysis::models::AnalysisEntry;

/// Tag each summary token with whether its lemma appears verbatim among the
/// original's lemmas.
///
/// Extraction runs on a blocking thread. Either text may be empty.
pub async fn analyze(
    extractor: &LemmaExtractor,
    original_text: String,
    summary_text: String,
) -> AppResult<Vec<AnalysisEntry>> {
    let start = Instant::now();
    let extractor = extractor.clone();

    let (original, summary) = tokio::task::spawn_blocking(move || {
        Ok::<_, lemmatizer::LemmaError>((
            extractor.extract(&original_text)?,
            extractor.extract(&summary_text)?,
        ))
    })
    .await
    .map_err(|e| AppError::Processing(format!("lemmatization task failed: {}", e)))??;

    let index = ExactLemmaSet::from_tokens(&original);
    let analysis = annotate(summary, &index);

    info!(
        original_tokens = original.len(),
        summary_tokens = analysis.len(),
        found = analysis.iter().filter(|e| e.found_in_original).count(),
        duration_ms = start.elapsed().as_millis() as u64,
        "text analysis completed"
    );

    Ok(analysis)
}
