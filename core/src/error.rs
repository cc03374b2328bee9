use crate::ident::ShortId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// Two distinct paths hashed to the same short id.
    #[error("identifier collision: `{id}` is claimed by both `{existing}` and `{incoming}`")]
    IdentifierCollision { id: ShortId, existing: String, incoming: String },

    /// The same canonical path reached the builder twice.
    #[error("document `{path}` was indexed twice")]
    DuplicatePath { path: String },

    #[error("corpus is empty, no ranking statistics can be computed")]
    EmptyCorpus,

    #[error("malformed {0} payload")]
    Malformed(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
