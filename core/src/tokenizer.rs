use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::{HashMap, HashSet};

/// Contraction rewrites, applied top to bottom. Order is load-bearing: `can't`
/// is consumed by the `n't` rule first and never reaches its own entry.
pub const CONTRACTIONS: &[(&str, &str)] = &[
    (r"n't\b", " not "),
    (r"can't\b", "can not "),
    (r"'ll\b", " will "),
    (r"'s\b", " is "),
    (r"'re\b", " are "),
    (r"'ve\b", " have "),
    (r"'m\b", " am "),
    (r"'d\b", " had "),
    // full-word
    (r"\bcannot\b", "can not"),
    (r"\bgonna\b", "going to"),
    (r"\bwanna\b", "want to"),
];

lazy_static! {
    static ref FRONT_MATTER: Regex = Regex::new(concat!(
        r"\A---(?:[ \t].*)?",
        r"(?:\n[ ]{0,3}[A-Za-z0-9_-]+:[ \t]*.*(?:\n[ ]{4,}.*)*)*",
        r"\n(?:\n|(?:---|\.\.\.)(?:[ \t].*)?)",
    ))
    .expect("valid regex");
    static ref PUNCTUATION: Regex =
        Regex::new(r#"[\s\~`’‘|\^°{}\[\]()<>\\%@#$\&\-+=/*"':;!?.,]+"#).expect("valid regex");
    static ref CONTRACTION_RULES: Vec<(Regex, &'static str)> = CONTRACTIONS
        .iter()
        .map(|(pat, repl)| (Regex::new(pat).expect("valid regex"), *repl))
        .collect();
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "about","above","after","again","all","also","am","an","and","another","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "came","can","cannot","come","could",
            "did","do","does","doing","during",
            "each","few","for","from","further",
            "get","got",
            "has","had","he","have","her","here","him","himself","his","how",
            "if","in","into","is","it","its","itself",
            "like","make","many","me","might","more","most","much","must","my","myself",
            "never","now","of","on","only","or","other","our","ours","ourselves","out","over","own",
            "said","same","see","should","since","so","some","still","such",
            "take","than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","way","we","well","were","what","where","when","which","while","who","whom","with","would","why",
            "you","your","yours","yourself",
            "a","b","c","d","e","f","g","h","i","j","k","l","m","n","o","p","q","r","s","t","u","v","w","x","y","z","_",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Split a leading front-matter block off `text`, returning `(block, rest)`.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    FRONT_MATTER.find(text).map(|m| (m.as_str(), &text[m.end()..]))
}

/// Strip front matter, NFD-normalize, lowercase, expand contractions and split
/// on whitespace/punctuation runs.
///
/// Empty strings at the text boundaries are kept: the length of the returned
/// vector is the document length used for ranking statistics.
pub fn normalize(text: &str) -> Vec<String> {
    let body = split_front_matter(text).map_or(text, |(_, rest)| rest);
    let mut lowered = body.nfd().collect::<String>().to_lowercase();
    for (re, repl) in CONTRACTION_RULES.iter() {
        lowered = re.replace_all(&lowered, NoExpand(*repl)).into_owned();
    }
    PUNCTUATION.split(&lowered).map(str::to_string).collect()
}

/// Maps a lowercase word to its canonical root.
pub trait Stem {
    fn stem(&self, word: &str) -> String;
}

/// Snowball English stemmer.
pub struct EnglishStemmer(Stemmer);

impl Default for EnglishStemmer {
    fn default() -> Self { Self(Stemmer::create(Algorithm::English)) }
}

impl Stem for EnglishStemmer {
    fn stem(&self, word: &str) -> String { self.0.stem(word).into_owned() }
}

/// Leaves words untouched; isolates indexing logic from linguistics in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityStemmer;

impl Stem for IdentityStemmer {
    fn stem(&self, word: &str) -> String { word.to_string() }
}

/// One document's contribution after filtering and stemming.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DocTerms {
    /// stemmed term -> frequency in the document
    pub terms: HashMap<String, u32>,
    /// raw tokens not seen before this document, in first-occurrence order
    pub new_raw: Vec<String>,
}

pub struct TermFilter<S> {
    stemmer: S,
}

impl<S: Stem> TermFilter<S> {
    pub fn new(stemmer: S) -> Self { Self { stemmer } }

    /// Drop empties and stopwords, stem the rest and count roots.
    /// `seen` holds raw tokens already recorded by earlier documents.
    pub fn filter_and_stem(&self, tokens: &[String], seen: &HashSet<String>) -> DocTerms {
        let mut out = DocTerms::default();
        let mut fresh: HashSet<&str> = HashSet::new();
        for tok in tokens {
            let tok = tok.trim();
            if tok.is_empty() || is_stopword(tok) { continue; }
            if !seen.contains(tok) && fresh.insert(tok) {
                out.new_raw.push(tok.to_string());
            }
            *out.terms.entry(self.stemmer.stem(tok)).or_insert(0) += 1;
        }
        out
    }
}

impl Default for TermFilter<EnglishStemmer> {
    fn default() -> Self { Self::new(EnglishStemmer::default()) }
}
