//! Lookup structures over the original text's lemmas.
//!
//! The synchronous and asynchronous analyses answer "is this summary lemma in
//! the original?" differently, and callers pick the strategy explicitly.

use std::collections::HashSet;

use lemmatizer::WordToken;

use super::matcher::lemmas_match;
use super::models::AnalysisEntry;

/// Membership test against the original text's lemmas.
pub trait LemmaIndex {
    fn contains(&self, lemma: &str) -> bool;
}

/// Exact lowercase membership.
#[derive(Debug, Default)]
pub struct ExactLemmaSet {
    lemmas: HashSet<String>,
}

impl ExactLemmaSet {
    pub fn from_tokens(tokens: &[WordToken]) -> Self {
        Self {
            lemmas: tokens.iter().map(|t| t.lemma.to_lowercase()).collect(),
        }
    }
}

impl LemmaIndex for ExactLemmaSet {
    fn contains(&self, lemma: &str) -> bool {
        self.lemmas.contains(&lemma.to_lowercase())
    }
}

/// Approximate membership: any original lemma that [`lemmas_match`]es.
#[derive(Debug, Default)]
pub struct FuzzyLemmaPool {
    lemmas: Vec<String>,
}

impl FuzzyLemmaPool {
    pub fn from_tokens(tokens: &[WordToken]) -> Self {
        Self {
            lemmas: tokens.iter().map(|t| t.lemma.clone()).collect(),
        }
    }
}

impl LemmaIndex for FuzzyLemmaPool {
    fn contains(&self, lemma: &str) -> bool {
        self.lemmas.iter().any(|candidate| lemmas_match(lemma, candidate))
    }
}

/// Tag every summary token with whether `index` contains its lemma.
pub fn annotate(summary: Vec<WordToken>, index: &dyn LemmaIndex) -> Vec<AnalysisEntry> {
    summary
        .into_iter()
        .map(|token| {
            let found = index.contains(&token.lemma);
            AnalysisEntry::new(token, found)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemmatizer::Upos;

    fn tokens(lemmas: &[&str]) -> Vec<WordToken> {
        lemmas
            .iter()
            .map(|lemma| WordToken {
                text: lemma.to_string(),
                lemma: lemma.to_string(),
                pos: Upos::Noun,
            })
            .collect()
    }

    #[test]
    fn test_strategies_disagree_on_near_miss() {
        let original = tokens(&["miska"]);

        assert!(!ExactLemmaSet::from_tokens(&original).contains("miška"));
        assert!(FuzzyLemmaPool::from_tokens(&original).contains("miška"));
    }

    #[test]
    fn test_exact_set_is_case_insensitive() {
        let set = ExactLemmaSet::from_tokens(&tokens(&["Ljubljana"]));
        assert!(set.contains("ljubljana"));
    }

    #[test]
    fn test_empty_index_contains_nothing() {
        assert!(!ExactLemmaSet::default().contains("hiša"));
        assert!(!FuzzyLemmaPool::default().contains("hiša"));
    }

    #[test]
    fn test_annotate_preserves_summary_order() {
        let index = ExactLemmaSet::from_tokens(&tokens(&["hiša", "biti"]));
        let entries = annotate(tokens(&["biti", "lep", "hiša"]), &index);

        let flags: Vec<_> = entries
            .iter()
            .map(|e| (e.lemma.as_str(), e.found_in_original))
            .collect();
        assert_eq!(flags, vec![("biti", true), ("lep", false), ("hiša", true)]);
    }
}
