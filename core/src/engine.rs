use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::index::{DocId, Index, InMemoryIndex};
use crate::indexer::Indexer;
use crate::kgram::KGramIndex;
use crate::pagerank::PageRankTable;
use crate::postings::PostingsList;
use crate::query::Query;
use crate::ranking::{Ranker, RankingType, ScoredDoc};
use crate::retrieval;
use crate::tokenizer::Tokenizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryType {
    Intersection,
    Phrase,
    Ranked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub path: String,
    pub score: f64,
}

/// Owns the indexes while documents are being added. Nothing can be queried
/// until [`EngineBuilder::build`] has run.
pub struct EngineBuilder {
    config: EngineConfig,
    tokenizer: Tokenizer,
    index: InMemoryIndex,
    kgrams: KGramIndex,
    indexer: Indexer,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let tokenizer = Tokenizer::new(&config.tokenizer)?;
        let kgrams = KGramIndex::new(config.kgram_k)?;
        Ok(Self {
            config,
            tokenizer,
            index: InMemoryIndex::new(),
            kgrams,
            indexer: Indexer::new(),
        })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Tokenizes `text` and indexes it under `path`.
    pub fn add_text(&mut self, path: &str, text: &str) -> Result<DocId> {
        let tokens = self.tokenizer.tokens(text);
        self.add_tokens(path, tokens)
    }

    /// Indexes an already tokenized document.
    pub fn add_tokens<T>(&mut self, path: &str, tokens: T) -> Result<DocId>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        self.indexer
            .index_document(&mut self.index, Some(&mut self.kgrams), path, tokens)
    }

    /// Adds terms to the k-gram index without indexing a document.
    pub fn add_kgram_terms<T>(&mut self, terms: T)
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        for term in terms {
            self.kgrams.insert(term.as_ref());
        }
    }

    pub fn num_docs(&self) -> usize {
        self.index.num_docs()
    }

    /// Closes the indexing pass.
    pub fn build(mut self) -> SearchEngine {
        self.index.cleanup();
        tracing::info!(
            num_docs = self.index.num_docs(),
            num_terms = self.index.num_terms(),
            num_kgram_terms = self.kgrams.num_terms(),
            "index build complete"
        );
        SearchEngine {
            config: self.config,
            tokenizer: self.tokenizer,
            index: self.index,
            kgrams: self.kgrams,
            pagerank: RwLock::new(None),
        }
    }
}

/// Read-only search over a finished index. Queries take `&self` and may run
/// concurrently; only the pagerank table can be swapped afterwards.
pub struct SearchEngine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    index: InMemoryIndex,
    kgrams: KGramIndex,
    pagerank: RwLock<Option<Arc<PageRankTable>>>,
}

impl SearchEngine {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &InMemoryIndex {
        &self.index
    }

    pub fn kgrams(&self) -> &KGramIndex {
        &self.kgrams
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn set_pagerank(&self, table: PageRankTable) {
        *self.pagerank.write() = Some(Arc::new(table));
    }

    /// Loads the pagerank table from `path`. On failure the error is logged,
    /// any previous table is dropped and pagerank ranking becomes unavailable.
    pub fn load_pagerank<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        match PageRankTable::from_file(path.as_ref()) {
            Ok(table) => {
                self.set_pagerank(table);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(path = %path.as_ref().display(), error = %err, "could not load pagerank table");
                *self.pagerank.write() = None;
                Err(err)
            }
        }
    }

    pub fn has_pagerank(&self) -> bool {
        self.pagerank.read().is_some()
    }

    pub fn search(&self, query: &Query, query_type: QueryType, ranking: RankingType) -> Result<Vec<SearchHit>> {
        let hits = match query_type {
            QueryType::Intersection => {
                self.unranked(retrieval::intersection_query(&self.index, query))
            }
            QueryType::Phrase => self.unranked(retrieval::phrase_query(&self.index, query)),
            QueryType::Ranked => {
                let table = self.pagerank.read().clone();
                let ranker = Ranker::new(&self.index, table.as_deref(), self.config.combination_weight);
                let ranked = ranker.rank(query, ranking)?;
                self.ranked(ranked)
            }
        };
        tracing::debug!(?query_type, ?ranking, terms = query.len(), hits = hits.len(), "search");
        Ok(hits)
    }

    /// Terms containing every one of `kgrams`.
    pub fn kgram_search(&self, kgrams: &[&str]) -> Result<Vec<String>> {
        let ids = self.kgrams.search(kgrams)?;
        Ok(self.kgrams.terms_for(&ids).into_iter().map(str::to_string).collect())
    }

    fn unranked(&self, postings: Option<PostingsList>) -> Vec<SearchHit> {
        postings
            .map(|list| list.doc_ids().map(|doc_id| self.hit(doc_id, 0.0)).collect())
            .unwrap_or_default()
    }

    fn ranked(&self, docs: Vec<ScoredDoc>) -> Vec<SearchHit> {
        docs.into_iter().map(|d| self.hit(d.doc_id, d.score)).collect()
    }

    fn hit(&self, doc_id: DocId, score: f64) -> SearchHit {
        let path = self
            .index
            .doc(doc_id)
            .map(|d| d.path.clone())
            .unwrap_or_default();
        SearchHit { doc_id, path, score }
    }
}
