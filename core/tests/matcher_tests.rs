use chat_core::{KnowledgeEntry, MatchResult, Matcher, TfIdfIndex, DECLINE_MESSAGE};

fn matcher(texts: &[&str]) -> Matcher {
    Matcher::new(texts.iter().map(|t| KnowledgeEntry::new(*t)).collect())
}

#[test]
fn cats_and_dogs_end_to_end() {
    let m = matcher(&["cats are great pets", "dogs are loyal companions"]);
    match m.query("tell me about cats") {
        MatchResult::Matched { document_index, response_text, score } => {
            assert_eq!(document_index, 0);
            assert_eq!(response_text, "cats are great pets");
            assert!((score - 2f64.ln()).abs() < 1e-12);
        }
        MatchResult::NoMatch => panic!("expected a match"),
    }
}

#[test]
fn exact_document_text_ranks_itself_highest() {
    let texts = [
        "reset your password from the account settings page",
        "shipping takes three to five business days",
        "refunds are issued to the original payment method",
        "contact support by email for account problems",
    ];
    let idx = TfIdfIndex::build(&texts);
    for (i, text) in texts.iter().enumerate() {
        let scores = idx.scores(text);
        let best = scores.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(scores[i], best, "document {i} should score maximal for its own text");
        assert_eq!(idx.best_match(text).map(|(d, _)| d), Some(i as u32));
    }
}

#[test]
fn repeated_shared_term_does_not_beat_exact_text() {
    let texts = ["apple banana", "banana banana banana banana", "cherry"];
    let idx = TfIdfIndex::build(&texts);
    let scores = idx.scores(texts[0]);
    assert!(scores[0] >= scores[1], "scores {scores:?}");
    assert!((scores[0] - (3f64.ln() + 1.5f64.ln())).abs() < 1e-12);
    assert!((scores[1] - 1.5f64.ln()).abs() < 1e-12);
    assert_eq!(scores[2], 0.0);
    assert_eq!(idx.best_match(texts[0]).map(|(d, _)| d), Some(0));

    let m = matcher(&texts);
    assert_eq!(m.query("banana").document_index(), Some(0));
}

#[test]
fn empty_query_never_matches() {
    let m = matcher(&["cats are great pets", "dogs are loyal companions"]);
    assert_eq!(m.query(""), MatchResult::NoMatch);
    assert_eq!(m.query("   ?!  "), MatchResult::NoMatch);
    assert_eq!(m.query("what is it that you are"), MatchResult::NoMatch);
}

#[test]
fn empty_corpus_never_matches() {
    let m = matcher(&[]);
    assert_eq!(m.query("cats"), MatchResult::NoMatch);
    assert_eq!(m.query(""), MatchResult::NoMatch);
    assert_eq!(m.query("cats").reply(), DECLINE_MESSAGE);
}

#[test]
fn out_of_vocabulary_is_ignored() {
    let m = matcher(&["cats are great pets", "dogs are loyal companions"]);
    assert_eq!(m.query("quantum chromodynamics"), MatchResult::NoMatch);
    assert_eq!(m.query("quantum cats").document_index(), Some(0));
}

#[test]
fn queries_are_deterministic() {
    let m = matcher(&["cats are great pets", "dogs are loyal companions", "fish are quiet pets"]);
    for q in ["pets", "loyal dogs", "cats fish", ""] {
        assert_eq!(m.query(q), m.query(q));
    }
}

#[test]
fn ties_go_to_earliest_document() {
    let m = matcher(&["unrelated filler text", "apples oranges", "oranges apples", "more filler"]);
    assert_eq!(m.query("apples").document_index(), Some(1));
    assert_eq!(m.query("oranges apples").document_index(), Some(1));
}

#[test]
fn term_in_every_document_contributes_nothing() {
    let m = matcher(&["great cats", "great dogs"]);
    assert_eq!(m.query("great"), MatchResult::NoMatch);
    assert_eq!(m.index().scores("great"), vec![0.0, 0.0]);
}

#[test]
fn absent_terms_do_not_score() {
    let idx = TfIdfIndex::build(&["cats", "dogs", "birds"]);
    let scores = idx.scores("cats dogs");
    assert!(scores[0] > 0.0);
    assert!(scores[1] > 0.0);
    assert_eq!(scores[2], 0.0);
}

#[test]
fn score_equal_to_threshold_is_not_a_match() {
    let ln2 = 2f64.ln();
    let exact = matcher(&["cats", "dogs"]).with_threshold(ln2);
    assert_eq!(exact.query("cats"), MatchResult::NoMatch);
    let below = matcher(&["cats", "dogs"]).with_threshold(ln2 - 1e-9);
    assert_eq!(below.query("cats").document_index(), Some(0));
}

#[test]
fn single_document_corpus_has_zero_idf() {
    // ln(1/1) = 0, so a lone document can never clear the threshold
    let m = matcher(&["cats are great pets"]);
    assert_eq!(m.query("cats"), MatchResult::NoMatch);
}

#[test]
fn matcher_is_shareable_across_threads() {
    let m = std::sync::Arc::new(matcher(&["cats are great pets", "dogs are loyal companions"]));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let m = m.clone();
            std::thread::spawn(move || m.query("loyal dogs").document_index())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), Some(1));
    }
}
