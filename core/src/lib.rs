//! In-memory search engine core: positional inverted index, boolean and
//! phrase retrieval, tf-idf / pagerank ranking, Rocchio relevance feedback
//! and a k-gram index for approximate term lookup.

pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod index;
pub mod indexer;
pub mod kgram;
pub mod pagerank;
pub mod postings;
pub mod query;
pub mod ranking;
pub mod retrieval;
pub mod tokenizer;

pub use config::{EngineConfig, FeedbackConfig, PageRankConfig};
pub use engine::{EngineBuilder, QueryType, SearchEngine, SearchHit};
pub use error::{Error, Result};
pub use index::{DocId, DocMeta, InMemoryIndex, Index};
pub use kgram::{KGramIndex, TermId};
pub use postings::{PostingsEntry, PostingsList};
pub use query::{Query, QueryTerm};
pub use ranking::{RankingType, ScoredDoc};
