pub mod document;
pub mod error;
pub mod ident;
pub mod index;
pub mod persist;
pub mod stats;
pub mod tokenizer;

pub use document::{Document, PageData};
pub use error::{IndexError, Result};
pub use ident::{IdentifierMap, ShortId};
pub use index::{Artifacts, DocNum, DocRecord, IndexBuilder, Posting, SearchIndex};
pub use stats::CorpusStats;
pub use tokenizer::{normalize, EnglishStemmer, IdentityStemmer, Stem};
