use crate::{Result, SearchError};
use std::collections::BTreeSet;

/// Split text on single spaces, dropping the empty tokens left by runs of spaces.
pub fn split_into_words(text: &str) -> Vec<&str> {
    text.split(' ').filter(|w| !w.is_empty()).collect()
}

/// A word is valid when it contains no C0 control characters.
pub fn is_valid_word(word: &str) -> bool {
    !word.chars().any(|c| c < ' ')
}

/// Distinct, non-empty, validated stop words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidStopWord(word.to_string()));
            }
            set.insert(word.to_string());
        }
        Ok(Self { words: set })
    }

    /// Stop words given as one space-separated string.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(split_into_words(text))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn filter<'t>(&self, words: impl IntoIterator<Item = &'t str>) -> Vec<&'t str> {
        words.into_iter().filter(|w| !self.contains(w)).collect()
    }
}

/// Tokenize a document body: every word is validated before stop words are dropped.
pub fn split_into_words_no_stop<'t>(text: &'t str, stop_words: &StopWords) -> Result<Vec<&'t str>> {
    let words = split_into_words(text);
    if let Some(bad) = words.iter().find(|w| !is_valid_word(w)) {
        return Err(SearchError::InvalidWord(bad.to_string()));
    }
    Ok(stop_words.filter(words))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_single_spaces() {
        assert_eq!(split_into_words("  white cat   and "), vec!["white", "cat", "and"]);
        assert!(split_into_words("").is_empty());
        assert!(split_into_words("    ").is_empty());
    }

    #[test]
    fn tabs_are_not_separators() {
        assert_eq!(split_into_words("a\tb c"), vec!["a\tb", "c"]);
        assert!(!is_valid_word("a\tb"));
    }

    #[test]
    fn control_characters_are_invalid() {
        assert!(is_valid_word("cat"));
        assert!(is_valid_word("кот"));
        assert!(!is_valid_word("ca\u{12}t"));
        assert!(!is_valid_word("\u{0}"));
        assert!(is_valid_word("\u{7f}"));
    }

    #[test]
    fn stop_words_collapse_and_skip_empty() {
        let stop = StopWords::new(["in", "", "the", "in"]).unwrap();
        assert_eq!(stop.len(), 2);
        assert!(stop.contains("in"));
        assert!(!stop.contains(""));
    }

    #[test]
    fn invalid_stop_word_is_rejected() {
        let err = StopWords::from_text("in t\u{1}he").unwrap_err();
        assert_eq!(err, SearchError::InvalidStopWord("t\u{1}he".into()));
    }

    #[test]
    fn no_stop_split_validates_before_filtering() {
        let stop = StopWords::from_text("and in").unwrap();
        let words = split_into_words_no_stop("cat and dog in city", &stop).unwrap();
        assert_eq!(words, vec!["cat", "dog", "city"]);
        let stop = StopWords::default();
        assert!(split_into_words_no_stop("cat do\u{3}g", &stop).is_err());
    }
}
