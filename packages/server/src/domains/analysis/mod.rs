//! Analysis domain - lexical fidelity of a summary against its source text.

pub mod actions;
pub mod index;
pub mod matcher;
pub mod models;

pub use index::{ExactLemmaSet, FuzzyLemmaPool, LemmaIndex};
pub use matcher::lemmas_match;
pub use models::*;
