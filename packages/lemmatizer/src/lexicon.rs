//! Form → (lemma, POS) lookup table.
//!
//! The on-disk format is one entry per line, tab separated:
//!
//! ```text
//! # form    lemma   UPOS
//! hiše      hiša    NOUN
//! je        biti    AUX
//! ```
//!
//! Forms are matched case-insensitively. When a form appears more than once the
//! first entry wins, so frequency-sorted exports resolve ambiguity sensibly.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{LemmaError, Result};
use crate::token::Upos;

/// A single lexicon row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    pub lemma: String,
    pub upos: Upos,
}

/// Immutable lookup table keyed by lowercased word form.
#[derive(Debug, Default, Clone)]
pub struct Lexicon {
    entries: HashMap<String, LexiconEntry>,
}

impl Lexicon {
    /// Read and parse a lexicon file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| LemmaError::LexiconIo {
            path: path.to_path_buf(),
            source,
        })?;
        let lexicon = Self::parse(&contents)?;
        debug!(path = %path.display(), forms = lexicon.len(), "lexicon parsed");
        Ok(lexicon)
    }

    /// Parse lexicon text in the tab-separated format.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut entries = HashMap::new();

        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let (form, lemma, upos) = match (fields.next(), fields.next(), fields.next()) {
                (Some(form), Some(lemma), Some(upos)) => (form.trim(), lemma.trim(), upos),
                _ => {
                    return Err(LemmaError::MalformedLexicon {
                        line: idx + 1,
                        reason: "expected form<TAB>lemma<TAB>UPOS".into(),
                    })
                }
            };

            if form.is_empty() || lemma.is_empty() {
                return Err(LemmaError::MalformedLexicon {
                    line: idx + 1,
                    reason: "empty form or lemma".into(),
                });
            }

            let upos = upos
                .parse::<Upos>()
                .map_err(|reason| LemmaError::MalformedLexicon {
                    line: idx + 1,
                    reason,
                })?;

            entries
                .entry(form.to_lowercase())
                .or_insert_with(|| LexiconEntry {
                    lemma: lemma.to_string(),
                    upos,
                });
        }

        Ok(Self { entries })
    }

    /// Build a lexicon from `(form, lemma, upos)` triples.
    pub fn from_entries<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str, Upos)>) -> Self {
        let mut entries = HashMap::new();
        for (form, lemma, upos) in rows {
            entries
                .entry(form.to_lowercase())
                .or_insert_with(|| LexiconEntry {
                    lemma: lemma.to_string(),
                    upos,
                });
        }
        Self { entries }
    }

    pub fn lookup(&self, form: &str) -> Option<&LexiconEntry> {
        self.entries.get(&form.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let lexicon = Lexicon::parse("# header\n\nhiše\thiša\tNOUN\r\nje\tbiti\tAUX\n").unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.lookup("je").unwrap().lemma, "biti");
        assert_eq!(lexicon.lookup("hiše").unwrap().upos, Upos::Noun);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lexicon = Lexicon::parse("Ljubljani\tLjubljana\tPROPN\n").unwrap();
        assert_eq!(lexicon.lookup("LJUBLJANI").unwrap().lemma, "Ljubljana");
    }

    #[test]
    fn test_first_entry_wins() {
        let lexicon = Lexicon::parse("je\tbiti\tAUX\nje\tjesti\tVERB\n").unwrap();
        assert_eq!(lexicon.lookup("je").unwrap().lemma, "biti");
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = Lexicon::parse("hiša\thiša\tNOUN\nbroken line\n").unwrap_err();
        match err {
            LemmaError::MalformedLexicon { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = Lexicon::parse("hiša\thiša\tNOUNISH\n").unwrap_err();
        assert!(matches!(err, LemmaError::MalformedLexicon { line: 1, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "velika\tvelik\tADJ").unwrap();
        let lexicon = Lexicon::load(file.path()).unwrap();
        assert_eq!(lexicon.lookup("velika").unwrap().lemma, "velik");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Lexicon::load("/definitely/not/here.tsv").unwrap_err();
        assert!(matches!(err, LemmaError::LexiconIo { .. }));
    }
}
