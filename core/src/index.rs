use crate::document::{Document, PageData};
use crate::error::{IndexError, Result};
use crate::ident::{IdentifierMap, ShortId};
use crate::stats::CorpusStats;
use crate::tokenizer::{normalize, EnglishStemmer, Stem, TermFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub type DocNum = u32;

/// Serialized as `[identifier, length]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(ShortId, u32)", into = "(ShortId, u32)")]
pub struct DocRecord {
    pub identifier: ShortId,
    pub length: u32,
}

impl From<(ShortId, u32)> for DocRecord {
    fn from((identifier, length): (ShortId, u32)) -> Self { Self { identifier, length } }
}

impl From<DocRecord> for (ShortId, u32) {
    fn from(r: DocRecord) -> Self { (r.identifier, r.length) }
}

/// Serialized as `[docNum, frequency]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(DocNum, u32)", into = "(DocNum, u32)")]
pub struct Posting {
    pub doc_num: DocNum,
    pub frequency: u32,
}

impl From<(DocNum, u32)> for Posting {
    fn from((doc_num, frequency): (DocNum, u32)) -> Self { Self { doc_num, frequency } }
}

impl From<Posting> for (DocNum, u32) {
    fn from(p: Posting) -> Self { (p.doc_num, p.frequency) }
}

/// The shipped search index. Posting lists are in corpus traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndex {
    #[serde(rename = "avgdl")]
    pub average_document_length: f64,
    #[serde(rename = "corpusSize")]
    pub corpus_size: u32,
    #[serde(rename = "docs")]
    pub documents: BTreeMap<DocNum, DocRecord>,
    #[serde(rename = "terms")]
    pub postings: BTreeMap<String, Vec<Posting>>,
}

impl SearchIndex {
    pub fn postings_for(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn frequency(&self, term: &str, doc_num: DocNum) -> Option<u32> {
        self.postings_for(term).iter().find(|p| p.doc_num == doc_num).map(|p| p.frequency)
    }
}

/// Everything one build pass produces.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub index: SearchIndex,
    pub suggestions: Vec<String>,
    pub identifiers: BTreeMap<ShortId, String>,
    pub pages: BTreeMap<ShortId, PageData>,
}

/// Owns every accumulator of a build pass. Documents are added one at a time
/// in traversal order; [`IndexBuilder::finish`] computes the final statistics.
pub struct IndexBuilder<S = EnglishStemmer> {
    filter: TermFilter<S>,
    identifiers: IdentifierMap,
    documents: BTreeMap<DocNum, DocRecord>,
    postings: BTreeMap<String, Vec<Posting>>,
    suggestions: Vec<String>,
    seen: HashSet<String>,
    stats: CorpusStats,
    pages: BTreeMap<ShortId, PageData>,
    site_url: Option<String>,
}

impl IndexBuilder<EnglishStemmer> {
    pub fn new() -> Self { Self::with_stemmer(EnglishStemmer::default()) }
}

impl Default for IndexBuilder<EnglishStemmer> {
    fn default() -> Self { Self::new() }
}

impl<S: Stem> IndexBuilder<S> {
    pub fn with_stemmer(stemmer: S) -> Self {
        Self {
            filter: TermFilter::new(stemmer),
            identifiers: IdentifierMap::new(),
            documents: BTreeMap::new(),
            postings: BTreeMap::new(),
            suggestions: Vec::new(),
            seen: HashSet::new(),
            stats: CorpusStats::new(),
            pages: BTreeMap::new(),
            site_url: None,
        }
    }

    pub fn with_identifiers(mut self, identifiers: IdentifierMap) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn with_site_url(mut self, site_url: Option<String>) -> Self {
        self.site_url = site_url;
        self
    }

    /// Index one document and return its `DocNum`.
    ///
    /// The id is assigned before anything else is touched, so a collision or
    /// a repeated path leaves the builder exactly as it was.
    pub fn add(&mut self, doc: &Document) -> Result<DocNum> {
        if self.identifiers.resolve(&self.identifiers.short_id(&doc.path)) == Some(doc.path.as_str()) {
            return Err(IndexError::DuplicatePath { path: doc.path.clone() });
        }
        let identifier = self.identifiers.assign(&doc.path)?;
        let dates = doc.dates();
        let tokens = normalize(&doc.raw_text(&dates));
        let length = tokens.len() as u32;
        let doc_num = self.stats.doc_count();

        let doc_terms = self.filter.filter_and_stem(&tokens, &self.seen);
        for raw in doc_terms.new_raw {
            self.seen.insert(raw.clone());
            self.suggestions.push(raw);
        }

        self.add_document(doc_num, DocRecord { identifier: identifier.clone(), length }, doc_terms.terms);
        self.stats.record_length(length);
        let page = doc.page_data(identifier.clone(), &dates, self.site_url.as_deref());
        self.pages.insert(identifier, page);

        tracing::debug!(path = %doc.path, doc_num, length, "indexed document");
        Ok(doc_num)
    }

    /// Merge one document's term frequencies into the global postings.
    pub fn add_document(&mut self, doc_num: DocNum, record: DocRecord, terms: HashMap<String, u32>) {
        for (term, frequency) in terms {
            self.postings.entry(term).or_default().push(Posting { doc_num, frequency });
        }
        self.documents.insert(doc_num, record);
    }

    pub fn corpus_size(&self) -> u32 { self.stats.doc_count() }

    pub fn suggestions(&self) -> &[String] { &self.suggestions }

    pub fn identifiers(&self) -> &IdentifierMap { &self.identifiers }

    /// Close the pass. Fails on an empty corpus rather than publishing an
    /// index without an average length.
    pub fn finish(self) -> Result<Artifacts> {
        let average_document_length = self.stats.finalize().ok_or(IndexError::EmptyCorpus)?;
        tracing::info!(
            corpus_size = self.stats.doc_count(),
            terms = self.postings.len(),
            suggestions = self.suggestions.len(),
            avgdl = average_document_length,
            "search index finalized"
        );
        Ok(Artifacts {
            index: SearchIndex {
                average_document_length,
                corpus_size: self.stats.doc_count(),
                documents: self.documents,
                postings: self.postings,
            },
            suggestions: self.suggestions,
            identifiers: self.identifiers.into_inner(),
            pages: self.pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{is_stopword, IdentityStemmer};

    #[test]
    fn cats_scenario() {
        let mut builder = IndexBuilder::new();
        let a = builder.add(&Document::new("docs/a.md", "Cats are great. Cats run fast.")).unwrap();
        let out = builder.finish().unwrap();
        assert_eq!(out.index.frequency("cat", a), Some(2));
        assert_eq!(out.index.frequency("run", a), Some(1));
        assert_eq!(out.index.frequency("great", a), Some(1));
        assert_eq!(out.index.frequency("fast", a), Some(1));
        assert!(out.index.postings_for("are").is_empty());
        // raw split length counts the trailing empty token
        assert_eq!(out.index.documents[&a].length, 7);
        assert_eq!(out.suggestions, vec!["cats", "great", "run", "fast"]);
    }

    #[test]
    fn single_document_average() {
        let mut builder = IndexBuilder::with_stemmer(IdentityStemmer);
        builder
            .add(&Document::new("one.html", "alpha beta gamma delta epsilon zeta eta theta iota kappa"))
            .unwrap();
        let out = builder.finish().unwrap();
        assert_eq!(out.index.corpus_size, 1);
        assert_eq!(out.index.average_document_length, 10.0);
    }

    #[test]
    fn postings_follow_traversal_order() {
        let mut builder = IndexBuilder::with_stemmer(IdentityStemmer);
        builder.add(&Document::new("a.html", "rust rust tools")).unwrap();
        builder.add(&Document::new("b.html", "tools")).unwrap();
        builder.add(&Document::new("c.html", "rust")).unwrap();
        let out = builder.finish().unwrap();
        let rust: Vec<_> = out.index.postings_for("rust").iter().map(|p| (p.doc_num, p.frequency)).collect();
        assert_eq!(rust, vec![(0, 2), (2, 1)]);
        let tools: Vec<_> = out.index.postings_for("tools").iter().map(|p| p.doc_num).collect();
        assert_eq!(tools, vec![0, 1]);
        assert_eq!(out.suggestions, vec!["rust", "tools"]);
    }

    #[test]
    fn corpus_invariants_hold() {
        let mut builder = IndexBuilder::new();
        let bodies = ["The quick brown fox.", "A lazy dog, sleeping!", "Foxes and dogs don't mix"];
        for (i, body) in bodies.iter().enumerate() {
            builder.add(&Document::new(format!("p{i}.html"), *body)).unwrap();
        }
        let out = builder.finish().unwrap();
        let index = &out.index;
        assert_eq!(index.corpus_size as usize, index.documents.len());
        let total: u32 = index.documents.values().map(|d| d.length).sum();
        assert!((index.average_document_length * index.corpus_size as f64 - total as f64).abs() < 1e-9);
        for (term, list) in &index.postings {
            assert!(!is_stopword(term), "{term} is a stopword");
            for p in list {
                assert!(p.frequency >= 1);
                assert!(index.documents.contains_key(&p.doc_num));
            }
        }
        assert_eq!(out.identifiers.len(), 3);
        assert_eq!(out.pages.len(), 3);
    }

    #[test]
    fn collision_leaves_builder_untouched() {
        let mut builder =
            IndexBuilder::with_stemmer(IdentityStemmer).with_identifiers(IdentifierMap::with_checksum(|_| 42));
        builder.add(&Document::new("a.html", "first")).unwrap();
        let err = builder.add(&Document::new("b.html", "second")).unwrap_err();
        assert!(matches!(err, IndexError::IdentifierCollision { .. }));
        assert_eq!(builder.corpus_size(), 1);
        assert_eq!(builder.suggestions(), ["first".to_string()]);
    }

    #[test]
    fn repeated_path_is_rejected() {
        let mut builder = IndexBuilder::with_stemmer(IdentityStemmer);
        builder.add(&Document::new("docs/a.html", "alpha")).unwrap();
        let err = builder.add(&Document::new("docs/a.html", "beta")).unwrap_err();
        assert!(matches!(err, IndexError::DuplicatePath { ref path } if path == "docs/a.html"));
        assert_eq!(builder.corpus_size(), 1);
        assert_eq!(builder.identifiers().len(), 1);
        assert_eq!(builder.suggestions(), ["alpha".to_string()]);

        let out = builder.finish().unwrap();
        assert_eq!(out.index.corpus_size as usize, out.identifiers.len());
        assert_eq!(out.pages.len(), 1);
        assert!(out.index.postings_for("beta").is_empty());
    }

    #[test]
    fn record_titles_reach_the_postings() {
        let mut doc = Document::new("z.html", "Plains animals");
        doc.title = Some("Zebra".into());
        let mut builder = IndexBuilder::new();
        let z = builder.add(&doc).unwrap();
        let out = builder.finish().unwrap();
        assert_eq!(out.index.frequency("zebra", z), Some(1));
        assert_eq!(out.suggestions[0], "zebra");
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let builder = IndexBuilder::new();
        assert!(matches!(builder.finish(), Err(IndexError::EmptyCorpus)));
    }
}
