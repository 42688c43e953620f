//! Testing utilities for crates built on the lemmatizer.
//!
//! Loading a real lexicon takes seconds; tests build small in-memory ones instead.

use std::time::Duration;

use crate::error::{LemmaError, Result};
use crate::extractor::LemmaExtractor;
use crate::lexicon::Lexicon;
use crate::pipeline::{LanguagePipeline, LexiconPipeline};
use crate::token::{Document, Upos};

/// A pipeline that fails every call with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingPipeline {
    message: String,
}

impl FailingPipeline {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl LanguagePipeline for FailingPipeline {
    fn annotate(&self, _text: &str) -> Result<Document> {
        Err(LemmaError::Processing(self.message.clone()))
    }
}

/// A pipeline that blocks its thread before answering with an empty document.
///
/// Built with [`SlowPipeline::on`], only texts containing the marker are slow.
#[derive(Debug, Clone)]
pub struct SlowPipeline {
    delay: Duration,
    marker: Option<String>,
}

impl SlowPipeline {
    /// Every text takes `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            marker: None,
        }
    }

    /// Only texts containing `marker` take `delay`.
    pub fn on(marker: impl Into<String>, delay: Duration) -> Self {
        Self {
            delay,
            marker: Some(marker.into()),
        }
    }
}

impl LanguagePipeline for SlowPipeline {
    fn annotate(&self, text: &str) -> Result<Document> {
        let slow = match &self.marker {
            Some(marker) => text.contains(marker.as_str()),
            None => true,
        };
        if slow {
            std::thread::sleep(self.delay);
        }
        Ok(Document::default())
    }
}

/// Extractor over an in-memory lexicon of `(form, lemma, upos)` rows.
pub fn extractor_with<'a>(
    rows: impl IntoIterator<Item = (&'a str, &'a str, Upos)>,
) -> LemmaExtractor {
    LemmaExtractor::new(LexiconPipeline::new(Lexicon::from_entries(rows)))
}
