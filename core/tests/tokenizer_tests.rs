use chat_core::tokenizer::{tokenize, Tokenizer, ENGLISH_STOPWORDS};

#[test]
fn it_normalizes_case_and_unicode() {
    let words = tokenize("Running RUNNERS! The ﬁne café's menu.");
    assert!(words.contains(&"running".to_string()));
    assert!(words.contains(&"runners".to_string()));
    // NFKC folds the "ﬁ" ligature
    assert!(words.contains(&"fine".to_string()));
    assert!(words.contains(&"café's".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);
}

#[test]
fn it_keeps_order_and_duplicates() {
    assert_eq!(tokenize("cats, dogs; cats."), vec!["cats", "dogs", "cats"]);
}

#[test]
fn it_keeps_digits() {
    assert_eq!(tokenize("Open 24/7 since 1999"), vec!["open", "24", "7", "since", "1999"]);
}

#[test]
fn all_stopwords_yield_nothing() {
    assert_eq!(tokenize("Is it the one that you are in?"), vec!["one"]);
    assert!(tokenize("it is what it is").is_empty());
}

#[test]
fn default_tokenizer_uses_english_list() {
    assert_eq!(Tokenizer::default().stopword_count(), ENGLISH_STOPWORDS.len());
    let tk = Tokenizer::with_stopwords(Vec::<String>::new());
    assert_eq!(tk.tokenize("the cat"), vec!["the", "cat"]);
}
