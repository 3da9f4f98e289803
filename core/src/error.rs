use crate::DocId;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("k-gram index can't be constructed for k = {0}")]
    InvalidKGramLength(usize),

    #[error("cannot search k-gram index: {found}-gram '{kgram}' provided instead of {expected}-gram")]
    KGramLengthMismatch {
        kgram: String,
        expected: usize,
        found: usize,
    },

    #[error("relevance feedback needs at least one document marked relevant")]
    NoRelevantDocuments,

    #[error("document {0} is already registered")]
    DocumentAlreadyRegistered(DocId),

    #[error("no pagerank table is loaded")]
    PageRankUnavailable,

    #[error("no pagerank score for document '{title}'")]
    MissingPageRank { title: String },

    #[error("invalid token pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
