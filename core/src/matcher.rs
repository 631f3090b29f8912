use crate::index::{DocId, TfIdfIndex};
use crate::knowledge::KnowledgeEntry;
use crate::tokenizer::Tokenizer;
use anyhow::{ensure, Result};
use serde::Serialize;

/// Minimum score a best match must strictly exceed.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Reply used when nothing in the knowledge base clears the threshold.
pub const DECLINE_MESSAGE: &str = "Sorry, I didn't understand that. Could you please rephrase?";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    Matched { document_index: DocId, response_text: String, score: f64 },
    NoMatch,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool { matches!(self, MatchResult::Matched { .. }) }

    pub fn document_index(&self) -> Option<DocId> {
        match self {
            MatchResult::Matched { document_index, .. } => Some(*document_index),
            MatchResult::NoMatch => None,
        }
    }

    /// The text to show the user: the matched response or [`DECLINE_MESSAGE`].
    pub fn reply(&self) -> &str {
        match self {
            MatchResult::Matched { response_text, .. } => response_text,
            MatchResult::NoMatch => DECLINE_MESSAGE,
        }
    }
}

/// Strict comparison; a score equal to the threshold does not match.
pub fn exceeds_threshold(score: f64, threshold: f64) -> bool {
    score > threshold
}

/// Fallback matcher: a knowledge base and the immutable index built over it.
#[derive(Debug, Clone)]
pub struct Matcher {
    entries: Vec<KnowledgeEntry>,
    index: TfIdfIndex,
    threshold: f64,
}

impl Matcher {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self::with_tokenizer(entries, Tokenizer::default())
    }

    pub fn with_tokenizer(entries: Vec<KnowledgeEntry>, tokenizer: Tokenizer) -> Self {
        let texts: Vec<&str> = entries.iter().map(KnowledgeEntry::indexed_text).collect();
        let index = TfIdfIndex::build_with_tokenizer(&texts, tokenizer);
        Self { entries, index, threshold: DEFAULT_THRESHOLD }
    }

    /// Pair a prebuilt index (e.g. from a snapshot) with its knowledge base.
    pub fn from_parts(entries: Vec<KnowledgeEntry>, index: TfIdfIndex) -> Result<Self> {
        ensure!(
            index.num_docs() as usize == entries.len(),
            "index covers {} documents but knowledge base has {} entries",
            index.num_docs(),
            entries.len()
        );
        Ok(Self { entries, index, threshold: DEFAULT_THRESHOLD })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 { self.threshold }

    pub fn index(&self) -> &TfIdfIndex { &self.index }

    pub fn entries(&self) -> &[KnowledgeEntry] { &self.entries }

    pub fn query(&self, text: &str) -> MatchResult {
        match self.index.best_match(text) {
            Some((doc, score)) if exceeds_threshold(score, self.threshold) => {
                tracing::debug!(doc, score, "knowledge base match");
                MatchResult::Matched {
                    document_index: doc,
                    response_text: self.entries[doc as usize].response.clone(),
                    score,
                }
            }
            best => {
                tracing::debug!(best_score = best.map(|(_, s)| s), threshold = self.threshold, "no knowledge base match");
                MatchResult::NoMatch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        assert!(!exceeds_threshold(0.1, DEFAULT_THRESHOLD));
        assert!(exceeds_threshold(0.1000001, DEFAULT_THRESHOLD));
    }

    #[test]
    fn reply_falls_back_to_decline() {
        assert_eq!(MatchResult::NoMatch.reply(), DECLINE_MESSAGE);
    }

    #[test]
    fn from_parts_rejects_mismatched_index() {
        let index = TfIdfIndex::build(&["one", "two"]);
        assert!(Matcher::from_parts(vec![KnowledgeEntry::new("one")], index).is_err());
    }

    #[test]
    fn returns_response_not_query() {
        let m = Matcher::new(vec![
            KnowledgeEntry::with_query("opening hours", "We are open 9 to 5."),
            KnowledgeEntry::with_query("shipping cost", "Shipping is free."),
        ]);
        let r = m.query("what are your opening hours");
        assert_eq!(r.document_index(), Some(0));
        assert_eq!(r.reply(), "We are open 9 to 5.");
    }
}
