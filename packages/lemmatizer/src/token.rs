//! Token and document types produced by a language pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Universal part-of-speech tag (plus `SPACE` for whitespace segments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Upos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
    Space,
}

impl Upos {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upos::Adj => "ADJ",
            Upos::Adp => "ADP",
            Upos::Adv => "ADV",
            Upos::Aux => "AUX",
            Upos::Cconj => "CCONJ",
            Upos::Det => "DET",
            Upos::Intj => "INTJ",
            Upos::Noun => "NOUN",
            Upos::Num => "NUM",
            Upos::Part => "PART",
            Upos::Pron => "PRON",
            Upos::Propn => "PROPN",
            Upos::Punct => "PUNCT",
            Upos::Sconj => "SCONJ",
            Upos::Sym => "SYM",
            Upos::Verb => "VERB",
            Upos::X => "X",
            Upos::Space => "SPACE",
        }
    }

    /// Punctuation, symbols and whitespace carry no lexical content.
    pub fn is_content(&self) -> bool {
        !matches!(self, Upos::Punct | Upos::Sym | Upos::Space)
    }
}

impl fmt::Display for Upos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Upos {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim().to_ascii_uppercase().as_str() {
            "ADJ" => Upos::Adj,
            "ADP" => Upos::Adp,
            "ADV" => Upos::Adv,
            "AUX" => Upos::Aux,
            "CCONJ" => Upos::Cconj,
            "DET" => Upos::Det,
            "INTJ" => Upos::Intj,
            "NOUN" => Upos::Noun,
            "NUM" => Upos::Num,
            "PART" => Upos::Part,
            "PRON" => Upos::Pron,
            "PROPN" => Upos::Propn,
            "PUNCT" => Upos::Punct,
            "SCONJ" => Upos::Sconj,
            "SYM" => Upos::Sym,
            "VERB" => Upos::Verb,
            "X" => Upos::X,
            "SPACE" => Upos::Space,
            other => return Err(format!("unknown UPOS tag: {}", other)),
        };
        Ok(tag)
    }
}

/// One word as annotated by the pipeline, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedWord {
    pub text: String,
    pub lemma: String,
    pub upos: Upos,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub words: Vec<AnnotatedWord>,
}

/// Pipeline output: sentences of annotated words, in text order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub sentences: Vec<Sentence>,
}

impl Document {
    /// Words in sentence-then-word traversal order.
    pub fn words(&self) -> impl Iterator<Item = &AnnotatedWord> {
        self.sentences.iter().flat_map(|s| s.words.iter())
    }
}

/// A content token handed to fidelity analysis.
///
/// Serialized as `{"word", "lemma", "pos"}`, the shape stored as a task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordToken {
    #[serde(rename = "word")]
    pub text: String,
    /// Always lowercase.
    pub lemma: String,
    pub pos: Upos,
}
