//! Content-token extraction.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::error::Result;
use crate::pipeline::LanguagePipeline;
use crate::token::WordToken;

/// Wraps a long-lived [`LanguagePipeline`] and produces content tokens.
///
/// Cheap to clone; clones share the same pipeline instance.
#[derive(Clone)]
pub struct LemmaExtractor {
    pipeline: Arc<dyn LanguagePipeline>,
}

impl LemmaExtractor {
    pub fn new(pipeline: impl LanguagePipeline + 'static) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Tokens in sentence-then-word order, without punctuation, symbols or
    /// whitespace. Lemmas are lowercased.
    ///
    /// A pipeline failure is returned as-is; no partial token list escapes.
    pub fn extract(&self, text: &str) -> Result<Vec<WordToken>> {
        let start = Instant::now();
        let document = self.pipeline.annotate(text)?;

        let tokens: Vec<WordToken> = document
            .words()
            .filter(|word| word.upos.is_content())
            .map(|word| WordToken {
                text: word.text.clone(),
                lemma: word.lemma.to_lowercase(),
                pos: word.upos,
            })
            .collect();

        debug!(
            text_len = text.len(),
            tokens = tokens.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "extracted lemmas"
        );

        Ok(tokens)
    }
}

impl std::fmt::Debug for LemmaExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LemmaExtractor").finish_non_exhaustive()
    }
}
