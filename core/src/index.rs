use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

/// TF-IDF index over an ordered corpus.
///
/// Weights are `tf_raw * ln(N / df)` with no length normalization. A document's
/// weight map only holds terms that occur in it and is the record of which
/// terms a document contains. Scoring adds `query_count * idf` for each query
/// term present in the document, so a document that repeats a term gains
/// nothing over one that mentions it once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfIdfIndex {
    tokenizer: Tokenizer,
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    weights: Vec<HashMap<TermId, f64>>,
    num_docs: u32,
}

impl TfIdfIndex {
    pub fn build<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::build_with_tokenizer(texts, Tokenizer::default())
    }

    pub fn build_with_tokenizer<S: AsRef<str>>(texts: &[S], tokenizer: Tokenizer) -> Self {
        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut next_term_id: TermId = 0;
        let mut counts: Vec<HashMap<TermId, u32>> = Vec::with_capacity(texts.len());

        for text in texts {
            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for term in tokenizer.tokenize(text.as_ref()) {
                let tid = *dictionary.entry(term).or_insert_with(|| {
                    let id = next_term_id;
                    next_term_id += 1;
                    id
                });
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
            counts.push(tf_counts);
        }

        let mut df = vec![0u32; next_term_id as usize];
        for tf_counts in &counts {
            for tid in tf_counts.keys() {
                df[*tid as usize] += 1;
            }
        }

        let num_docs = counts.len() as u32;
        let weights: Vec<HashMap<TermId, f64>> = counts
            .into_iter()
            .map(|tf_counts| {
                tf_counts
                    .into_iter()
                    .map(|(tid, tf_raw)| (tid, tf_raw as f64 * idf_for(num_docs, df[tid as usize])))
                    .collect()
            })
            .collect();

        tracing::debug!(num_docs, num_terms = dictionary.len(), "built tf-idf index");
        Self { tokenizer, dictionary, df, weights, num_docs }
    }

    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    pub fn num_docs(&self) -> u32 { self.num_docs }

    pub fn num_terms(&self) -> usize { self.dictionary.len() }

    pub fn is_empty(&self) -> bool { self.num_docs == 0 }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    /// Number of documents containing `term`, or 0 for out-of-vocabulary terms.
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.term_id(term).map_or(0, |tid| self.df[tid as usize])
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_id(term).map(|tid| self.idf_of(tid))
    }

    fn idf_of(&self, tid: TermId) -> f64 {
        idf_for(self.num_docs, self.df[tid as usize])
    }

    /// Stored weight of `term` in document `doc`; 0 when the document lacks it.
    pub fn weight(&self, doc: DocId, term: &str) -> f64 {
        match (self.weights.get(doc as usize), self.term_id(term)) {
            (Some(w), Some(tid)) => w.get(&tid).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Terms of document `doc` with their weights, for diagnostics.
    pub fn document_terms(&self, doc: DocId) -> Vec<(&str, f64)> {
        let Some(w) = self.weights.get(doc as usize) else { return Vec::new() };
        let mut terms: Vec<(&str, f64)> = self
            .dictionary
            .iter()
            .filter_map(|(term, tid)| w.get(tid).map(|weight| (term.as_str(), *weight)))
            .collect();
        terms.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms
    }

    // Ordered so the floating-point sum is the same on every call.
    fn query_counts(&self, text: &str) -> BTreeMap<TermId, u32> {
        let mut tf_q: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in self.tokenizer.tokenize(text) {
            if let Some(&tid) = self.dictionary.get(&term) {
                *tf_q.entry(tid).or_insert(0) += 1;
            }
        }
        tf_q
    }

    /// Score of every document for `text`, in corpus order.
    pub fn scores(&self, text: &str) -> Vec<f64> {
        let tf_q = self.query_counts(text);
        self.weights
            .iter()
            .map(|w| {
                tf_q.iter()
                    .filter(|(tid, _)| w.contains_key(*tid))
                    .fold(0.0, |acc, (tid, count)| acc + *count as f64 * self.idf_of(*tid))
            })
            .collect()
    }

    /// Highest-scoring document with a positive score. Ties keep the earliest document.
    pub fn best_match(&self, text: &str) -> Option<(DocId, f64)> {
        let mut best: Option<(DocId, f64)> = None;
        for (doc, score) in self.scores(text).into_iter().enumerate() {
            let best_score = best.map_or(0.0, |(_, s)| s);
            if score > best_score {
                best = Some((doc as DocId, score));
            }
        }
        best
    }

    pub(crate) fn check_invariants(&self) -> bool {
        let num_terms = self.df.len();
        num_terms == self.dictionary.len()
            && self.weights.len() == self.num_docs as usize
            && self.df.iter().all(|&d| d >= 1 && d <= self.num_docs)
            && self.dictionary.values().all(|&tid| (tid as usize) < num_terms)
            && self.weights.iter().all(|w| w.keys().all(|&tid| (tid as usize) < num_terms))
    }
}

fn idf_for(num_docs: u32, df: u32) -> f64 {
    (num_docs as f64 / df.max(1) as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_and_df() {
        let idx = TfIdfIndex::build(&["cats are great pets", "dogs are great companions"]);
        assert_eq!(idx.num_docs(), 2);
        // cats, great, pets, dogs, companions
        assert_eq!(idx.num_terms(), 5);
        assert_eq!(idx.term_id("cats"), Some(0));
        assert_eq!(idx.doc_frequency("great"), 2);
        assert_eq!(idx.doc_frequency("cats"), 1);
        assert_eq!(idx.doc_frequency("unicorn"), 0);
        assert!(idx.check_invariants());
    }

    #[test]
    fn shared_terms_weigh_zero() {
        let idx = TfIdfIndex::build(&["cats are great", "dogs are great"]);
        assert_eq!(idx.weight(0, "great"), 0.0);
        assert!((idx.weight(0, "cats") - 2f64.ln()).abs() < 1e-12);
        assert_eq!(idx.weight(1, "cats"), 0.0);
    }

    #[test]
    fn raw_counts_scale_weight() {
        let idx = TfIdfIndex::build(&["cats cats cats", "dogs"]);
        assert!((idx.weight(0, "cats") - 3.0 * 2f64.ln()).abs() < 1e-12);
        let terms = idx.document_terms(0);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].0, "cats");
    }

    #[test]
    fn empty_corpus() {
        let idx = TfIdfIndex::build::<&str>(&[]);
        assert!(idx.is_empty());
        assert_eq!(idx.num_terms(), 0);
        assert!(idx.scores("anything").is_empty());
        assert_eq!(idx.best_match("anything"), None);
        assert!(idx.check_invariants());
    }

    #[test]
    fn idf_is_natural_log_of_inverse_df() {
        let idx = TfIdfIndex::build(&["cats great", "dogs great", "birds"]);
        assert!((idx.idf("cats").unwrap() - 3f64.ln()).abs() < 1e-12);
        assert!((idx.idf("great").unwrap() - 1.5f64.ln()).abs() < 1e-12);
        assert_eq!(idx.idf("unicorn"), None);
    }

    #[test]
    fn repeated_terms_do_not_inflate_scores() {
        let idx = TfIdfIndex::build(&["cats dogs", "dogs dogs dogs dogs", "birds"]);
        let scores = idx.scores("dogs");
        assert_eq!(scores[0], scores[1]);
    }

    #[test]
    fn unmatched_documents_score_positive_zero() {
        let idx = TfIdfIndex::build(&["cats", "dogs"]);
        let scores = idx.scores("cats");
        assert_eq!(scores[1], 0.0);
        assert!(scores[1].is_sign_positive());
        assert!(idx.scores("").iter().all(|s| s.is_sign_positive()));
    }

    #[test]
    fn out_of_range_term_ids_fail_invariants() {
        let mut idx = TfIdfIndex::build(&["cats", "dogs"]);
        idx.dictionary.insert("ghost".into(), 7);
        idx.df.push(1);
        assert!(!idx.check_invariants());

        let mut idx = TfIdfIndex::build(&["cats", "dogs"]);
        idx.weights[0].insert(9, 1.0);
        assert!(!idx.check_invariants());
    }

    #[test]
    fn query_counts_multiply() {
        let idx = TfIdfIndex::build(&["cats", "dogs"]);
        let once = idx.scores("cats")[0];
        let twice = idx.scores("cats cats")[0];
        assert!((twice - 2.0 * once).abs() < 1e-12);
    }
}
