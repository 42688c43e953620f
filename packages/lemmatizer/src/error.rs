//! Typed errors for the lemmatizer library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for lemmatizer operations.
pub type Result<T> = std::result::Result<T, LemmaError>;

/// Errors raised while loading or running a language pipeline.
#[derive(Debug, Error)]
pub enum LemmaError {
    /// Lexicon file could not be read
    #[error("failed to read lexicon {path}: {source}")]
    LexiconIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Lexicon line is not `form<TAB>lemma<TAB>UPOS`
    #[error("malformed lexicon line {line}: {reason}")]
    MalformedLexicon { line: usize, reason: String },

    /// Pipeline failed on the given input
    #[error("processing error: {0}")]
    Processing(String),
}
