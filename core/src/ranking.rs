//! Ranked retrieval: tf-idf, pagerank, and a linear mix of the two.
//!
//! Scores are kept in per-query [`ScoredDoc`] values; the index itself is
//! only read.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::index::{DocId, Index};
use crate::pagerank::PageRankTable;
use crate::postings::{PostingsEntry, PostingsList};
use crate::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingType {
    TfIdf,
    PageRank,
    Combination,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// Sorts by descending score. Equal scores keep their relative order.
pub fn sort_by_score(docs: &mut [ScoredDoc]) {
    docs.sort_by(|a, b| b.score.total_cmp(&a.score));
}

pub struct Ranker<'a, I: Index + ?Sized> {
    index: &'a I,
    pagerank: Option<&'a PageRankTable>,
    /// Share of the tf-idf score in combination ranking.
    weight: f64,
}

impl<'a, I: Index + ?Sized> Ranker<'a, I> {
    pub fn new(index: &'a I, pagerank: Option<&'a PageRankTable>, weight: f64) -> Self {
        Self { index, pagerank, weight }
    }

    pub fn rank(&self, query: &Query, ranking: RankingType) -> Result<Vec<ScoredDoc>> {
        match ranking {
            RankingType::TfIdf => Ok(self.rank_tf_idf(query)),
            RankingType::PageRank => self.rank_pagerank(query),
            RankingType::Combination => Ok(self.rank_combination(query)),
        }
    }

    /// Union of the documents of every query term, deduplicated by doc id.
    pub fn candidates(&self, query: &Query) -> PostingsList {
        let mut results = PostingsList::new();
        for qt in query.terms() {
            let Some(postings) = self.index.postings(&qt.term) else {
                continue;
            };
            for entry in postings {
                if !results.fast_contains(entry.doc_id) {
                    results.add(PostingsEntry::new(entry.doc_id));
                }
            }
        }
        results
    }

    /// Accumulated `tf * ln(N / df) * weight` per document, divided by the
    /// document length.
    pub fn tf_idf_scores(&self, query: &Query) -> HashMap<DocId, f64> {
        let n = self.index.num_docs() as f64;
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for qt in query.terms() {
            let Some(postings) = self.index.postings(&qt.term) else {
                continue;
            };
            let df = postings.len();
            if df == 0 {
                continue;
            }
            let idf = (n / df as f64).ln();
            for entry in postings {
                *scores.entry(entry.doc_id).or_insert(0.0) +=
                    entry.term_frequency() as f64 * idf * qt.weight;
            }
        }
        for (doc_id, score) in scores.iter_mut() {
            match self.index.doc(*doc_id).map(|d| d.length) {
                Some(len) if len > 0 => *score /= len as f64,
                _ => tracing::warn!(doc_id, "no document length, tf-idf left unnormalized"),
            }
        }
        scores
    }

    pub fn rank_tf_idf(&self, query: &Query) -> Vec<ScoredDoc> {
        let scores = self.tf_idf_scores(query);
        let mut ranked: Vec<ScoredDoc> = self
            .candidates(query)
            .doc_ids()
            .map(|doc_id| ScoredDoc {
                doc_id,
                score: scores.get(&doc_id).copied().unwrap_or(0.0),
            })
            .collect();
        sort_by_score(&mut ranked);
        ranked
    }

    /// Scores each document by its pagerank. Every candidate must be in the
    /// table.
    pub fn rank_pagerank(&self, query: &Query) -> Result<Vec<ScoredDoc>> {
        let table = self.pagerank.ok_or(Error::PageRankUnavailable)?;
        let mut ranked = Vec::new();
        for doc_id in self.candidates(query).doc_ids() {
            let title = self.title(doc_id);
            let score = table
                .get(&title)
                .ok_or(Error::MissingPageRank { title })?;
            ranked.push(ScoredDoc { doc_id, score });
        }
        sort_by_score(&mut ranked);
        Ok(ranked)
    }

    /// `(1 - w) * pagerank + w * tf-idf`. Documents without a pagerank, or a
    /// missing table, count as pagerank 0.
    pub fn rank_combination(&self, query: &Query) -> Vec<ScoredDoc> {
        if self.pagerank.is_none() {
            tracing::warn!("no pagerank table loaded, combination ranking uses tf-idf only");
        }
        let tf_idf = self.tf_idf_scores(query);
        let w = self.weight;
        let mut ranked: Vec<ScoredDoc> = self
            .candidates(query)
            .doc_ids()
            .map(|doc_id| {
                let pr = self
                    .pagerank
                    .and_then(|t| t.get(&self.title(doc_id)))
                    .unwrap_or(0.0);
                let lexical = tf_idf.get(&doc_id).copied().unwrap_or(0.0);
                ScoredDoc { doc_id, score: (1.0 - w) * pr + w * lexical }
            })
            .collect();
        sort_by_score(&mut ranked);
        ranked
    }

    fn title(&self, doc_id: DocId) -> String {
        match self.index.doc(doc_id) {
            Some(meta) => meta.title().to_string(),
            None => doc_id.to_string(),
        }
    }
}
