use sitedex_core::tokenizer::{normalize, EnglishStemmer, TermFilter};
use std::collections::HashSet;

fn stems(text: &str) -> Vec<String> {
    let filter = TermFilter::new(EnglishStemmer::default());
    let mut words: Vec<String> = filter.filter_and_stem(&normalize(text), &HashSet::new()).terms.into_keys().collect();
    words.sort();
    words
}

#[test]
fn it_normalizes_and_stems() {
    let words = stems("Running Runners RUN! I'm gonna run.");
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"go".to_string()));
    assert!(!words.iter().any(|w| w.contains('\'')));
}

#[test]
fn it_filters_stopwords() {
    let words = stems("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"quick".to_string()));
}

#[test]
fn it_counts_raw_split_length() {
    let tokens = normalize("---\ntitle: Skip me\n---\nHello, world!");
    assert_eq!(tokens, vec!["", "hello", "world", ""]);
}
