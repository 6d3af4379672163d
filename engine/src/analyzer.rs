//! Text analysis pipeline: tokenize, lowercase, drop stop words, stem.
//!
//! The same pipeline runs over document text at ingest time and over query
//! phrases at search time, so index keys and query tokens always agree.

use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct StopWord {
    rank: u32,
    word: String,
}

lazy_static! {
    static ref STOP_WORDS: HashMap<String, u32> = {
        let words: Vec<StopWord> = serde_json::from_str(include_str!("../assets/stop_words.json"))
            .expect("valid stop word table");
        words.into_iter().map(|w| (w.word, w.rank)).collect()
    };
}

/// Splits text into maximal runs of letter and digit code points.
#[derive(Debug, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Lowercases tokens and drops members of the stop word table.
#[derive(Debug, Default)]
pub struct Filterer;

impl Filterer {
    pub fn lowercase(&self, token: &str) -> String {
        token.to_lowercase()
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        STOP_WORDS.contains_key(token)
    }

    /// Frequency rank of a stop word, exposed for diagnostics.
    pub fn rank(&self, token: &str) -> Option<u32> {
        STOP_WORDS.get(token).copied()
    }
}

/// Reduces tokens to their English Snowball stem.
pub struct EnglishStemmer {
    stemmer: Stemmer,
}

impl EnglishStemmer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    pub fn stem(&self, token: &str) -> String {
        self.stemmer.stem(token).into_owned()
    }
}

impl Default for EnglishStemmer {
    fn default() -> Self {
        Self::new()
    }
}

/// The composed analysis pipeline. Pure and thread-safe; a shared reference
/// can be used from any number of worker threads.
pub struct Analyzer {
    tokenizer: Tokenizer,
    filterer: Filterer,
    stemmer: EnglishStemmer,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer,
            filterer: Filterer,
            stemmer: EnglishStemmer::new(),
        }
    }

    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .map(|token| self.filterer.lowercase(token))
            .filter(|token| !self.filterer.is_stop_word(token))
            .map(|token| self.stemmer.stem(&token))
            .collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_non_alphanumeric() {
        let tokens = Tokenizer.tokenize("Hello, world! a-b_c 42nd");
        assert_eq!(tokens, vec!["Hello", "world", "a", "b", "c", "42nd"]);
    }

    #[test]
    fn lowercases_and_stems() {
        let tokens = Analyzer::new().analyze("Running runners RAN");
        assert_eq!(tokens, vec!["run", "runner", "ran"]);
    }

    #[test]
    fn drops_stop_words_after_lowercasing() {
        let tokens = Analyzer::new().analyze("The Quick Brown Fox");
        assert_eq!(tokens, vec!["quick", "brown", "fox"]);
    }

    #[test]
    fn stop_word_ranks_are_exposed() {
        assert_eq!(Filterer.rank("the"), Some(1));
        assert_eq!(Filterer.rank("fox"), None);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(Analyzer::new().analyze("").is_empty());
        assert!(Analyzer::new().analyze("  ,.;  ").is_empty());
    }
}
