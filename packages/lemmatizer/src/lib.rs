//! Lexicon-backed lemmatization for fidelity analysis.
//!
//! Turns raw text into ordered `(word, lemma, POS)` tokens. The heavy part is the
//! lexicon: it is loaded once at process start and shared by every caller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lemmatizer::{LemmaExtractor, LexiconPipeline};
//!
//! let pipeline = LexiconPipeline::load("/root/lexicon/sl.tsv")?;
//! let extractor = LemmaExtractor::new(pipeline);
//!
//! for token in extractor.extract("Hiša je velika.")? {
//!     println!("{} -> {} ({})", token.text, token.lemma, token.pos);
//! }
//! ```
//!
//! # Modules
//!
//! - [`token`] - Universal POS tags, annotated documents, word tokens
//! - [`lexicon`] - Form → (lemma, POS) lookup table
//! - [`pipeline`] - The [`LanguagePipeline`] seam and its lexicon implementation
//! - [`extractor`] - Content-token extraction on top of a pipeline
//! - [`testing`] - Fixtures for crates that depend on this one

pub mod error;
pub mod extractor;
pub mod lexicon;
pub mod pipeline;
pub mod testing;
pub mod token;

pub use error::{LemmaError, Result};
pub use extractor::LemmaExtractor;
pub use lexicon::{Lexicon, LexiconEntry};
pub use pipeline::{LanguagePipeline, LexiconPipeline};
pub use token::{AnnotatedWord, Document, Sentence, Upos, WordToken};
