use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

/// Common English function words dropped before indexing and scoring.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","can't","cannot","could","couldn't",
    "did","didn't","do","does","doesn't","doing","don't","down","during",
    "each","few","for","from","further",
    "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
    "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
    "let's","me","more","most","mustn't","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
    "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
    "under","until","up","very",
    "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
    "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves",
];

lazy_static! {
    // Word characters with optional internal apostrophes, so "don't" stays one token.
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}_]+(?:'[\p{L}\p{N}_]+)*").expect("valid regex");
    static ref DEFAULT: Tokenizer = Tokenizer::default();
}

/// Text normalizer shared by index construction and query scoring.
///
/// Both sides of a match must go through the same instance, which is why the
/// index stores its tokenizer rather than calling the free [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::with_stopwords(ENGLISH_STOPWORDS.iter().copied())
    }
}

impl Tokenizer {
    pub fn with_stopwords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stopwords = words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        Self { stopwords }
    }

    pub fn is_stopword(&self, token: &str) -> bool { self.stopwords.contains(token) }

    pub fn stopword_count(&self) -> usize { self.stopwords.len() }

    /// NFKC-normalize, lowercase, split into word tokens and drop stop words.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text
            .nfkc()
            .map(|c| if c == '\u{2019}' { '\'' } else { c })
            .collect::<String>()
            .to_lowercase();
        RE.find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|token| !self.is_stopword(token))
            .map(str::to_string)
            .collect()
    }
}

/// Tokenize with the built-in English stop-word list.
pub fn tokenize(text: &str) -> Vec<String> {
    DEFAULT.tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Tell me about CATS, please!");
        assert_eq!(t, vec!["tell", "cats", "please"]);
    }

    #[test]
    fn contractions_hit_stopwords() {
        assert!(tokenize("don't").is_empty());
        assert!(tokenize("Don\u{2019}t").is_empty());
    }

    #[test]
    fn punctuation_only_is_empty() {
        assert!(tokenize("?!... --- ,,,").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn custom_stopwords_are_lowercased() {
        let tk = Tokenizer::with_stopwords(["Cats"]);
        assert_eq!(tk.tokenize("the cats"), vec!["the"]);
    }
}
