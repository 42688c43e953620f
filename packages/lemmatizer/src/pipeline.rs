//! Language pipeline seam and the lexicon-backed implementation.
//!
//! A pipeline performs tokenization, POS tagging and lemmatization in one pass and
//! returns every segment it saw, including punctuation and whitespace. Filtering
//! is the extractor's job.

use std::path::Path;
use std::time::Instant;

use tracing::info;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::lexicon::Lexicon;
use crate::token::{AnnotatedWord, Document, Sentence, Upos};

/// Tokenize + tag + lemmatize.
///
/// Implementations are shared across request handlers and worker threads, so they
/// must tolerate concurrent `annotate` calls. A backend that cannot should put its
/// own request queue behind this trait.
pub trait LanguagePipeline: Send + Sync {
    fn annotate(&self, text: &str) -> Result<Document>;
}

/// Pipeline that segments text per UAX #29 and resolves lemmas from a [`Lexicon`].
///
/// The lexicon is read-only after construction, so concurrent callers never
/// contend.
#[derive(Debug, Clone)]
pub struct LexiconPipeline {
    lexicon: Lexicon,
}

impl LexiconPipeline {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Load the lexicon from disk. This is the expensive start-up step.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let start = Instant::now();
        let lexicon = Lexicon::load(path.as_ref())?;
        info!(
            path = %path.as_ref().display(),
            forms = lexicon.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "language pipeline loaded"
        );
        Ok(Self::new(lexicon))
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn annotate_word(&self, segment: &str, sentence_initial: bool) -> AnnotatedWord {
        if is_numeric(segment) {
            return AnnotatedWord {
                text: segment.to_string(),
                lemma: segment.to_string(),
                upos: Upos::Num,
            };
        }

        if let Some(entry) = self.lexicon.lookup(segment) {
            return AnnotatedWord {
                text: segment.to_string(),
                lemma: entry.lemma.clone(),
                upos: entry.upos,
            };
        }

        let capitalised = segment.chars().next().is_some_and(char::is_uppercase);
        let upos = if capitalised && !sentence_initial {
            Upos::Propn
        } else {
            Upos::X
        };

        AnnotatedWord {
            text: segment.to_string(),
            lemma: segment.to_lowercase(),
            upos,
        }
    }
}

impl LanguagePipeline for LexiconPipeline {
    fn annotate(&self, text: &str) -> Result<Document> {
        let mut sentences = Vec::new();

        for raw_sentence in text.split_sentence_bounds() {
            let mut words = Vec::new();
            let mut seen_word = false;

            for segment in raw_sentence.split_word_bounds() {
                let word = match classify(segment) {
                    Segment::Word => {
                        let word = self.annotate_word(segment, !seen_word);
                        seen_word = true;
                        word
                    }
                    Segment::Tagged(upos) => AnnotatedWord {
                        text: segment.to_string(),
                        lemma: segment.to_string(),
                        upos,
                    },
                };
                words.push(word);
            }

            if !words.is_empty() {
                sentences.push(Sentence { words });
            }
        }

        Ok(Document { sentences })
    }
}

enum Segment {
    Word,
    Tagged(Upos),
}

fn classify(segment: &str) -> Segment {
    if segment.chars().all(char::is_whitespace) {
        Segment::Tagged(Upos::Space)
    } else if segment.chars().any(char::is_alphanumeric) {
        Segment::Word
    } else if segment.chars().all(is_punctuation) {
        Segment::Tagged(Upos::Punct)
    } else {
        Segment::Tagged(Upos::Sym)
    }
}

fn is_numeric(segment: &str) -> bool {
    segment.chars().any(|c| c.is_ascii_digit())
        && segment
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

fn is_punctuation(c: char) -> bool {
    matches!(
        c,
        '!' | '"'
            | '#'
            | '%'
            | '&'
            | '\''
            | '('
            | ')'
            | '*'
            | ','
            | '-'
            | '.'
            | '/'
            | ':'
            | ';'
            | '?'
            | '@'
            | '['
            | '\\'
            | ']'
            | '_'
            | '{'
            | '}'
            | '¡'
            | '¿'
            | '«'
            | '»'
            | '‹'
            | '›'
            | '„'
            | '“'
            | '”'
            | '‚'
            | '‘'
            | '’'
            | '…'
            | '–'
            | '—'
            | '·'
    )
}
