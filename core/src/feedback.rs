//! Rocchio relevance feedback.

use std::collections::HashMap;

use crate::config::FeedbackConfig;
use crate::engine::SearchHit;
use crate::error::{Error, Result};
use crate::query::{Query, QueryTerm};
use crate::tokenizer::DocumentReader;

impl Query {
    /// Replaces the query with `alpha * query + beta * centroid(relevant)`.
    ///
    /// `relevant[i]` judges `results[i]`. Only the first
    /// `top_retrieved_docs` results are read back; each token of a relevant
    /// document adds `beta / R` to its term, where `R` counts every result
    /// marked relevant. New terms follow the original ones in first-seen
    /// order.
    pub fn relevance_feedback(
        &mut self,
        results: &[SearchHit],
        relevant: &[bool],
        reader: &dyn DocumentReader,
        cfg: &FeedbackConfig,
    ) -> Result<()> {
        let num_relevant = relevant.iter().filter(|&&r| r).count();
        if num_relevant == 0 {
            return Err(Error::NoRelevantDocuments);
        }

        let mut vector = WeightVector::default();
        for qt in &self.terms {
            vector.add(&qt.term, cfg.alpha * qt.weight);
        }

        let beta_weight = cfg.beta() / num_relevant as f64;
        let top = cfg.top_retrieved_docs.min(results.len()).min(relevant.len());
        for (hit, _) in results[..top].iter().zip(&relevant[..top]).filter(|&(_, &r)| r) {
            match reader.read_tokens(&hit.path) {
                Ok(tokens) => {
                    for token in tokens {
                        vector.add(&token, beta_weight);
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %hit.path, error = %err, "could not re-read document for feedback")
                }
            }
        }

        tracing::debug!(relevant = num_relevant, terms = vector.terms.len(), "relevance feedback applied");
        self.terms = vector.terms;
        Ok(())
    }
}

/// Term weights accumulated in insertion order.
#[derive(Default)]
struct WeightVector {
    slots: HashMap<String, usize>,
    terms: Vec<QueryTerm>,
}

impl WeightVector {
    fn add(&mut self, term: &str, weight: f64) {
        match self.slots.get(term) {
            Some(&i) => self.terms[i].weight += weight,
            None => {
                self.slots.insert(term.to_string(), self.terms.len());
                self.terms.push(QueryTerm::new(term, weight));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Docs(HashMap<&'static str, &'static str>);

    impl DocumentReader for Docs {
        fn read_tokens(&self, path: &str) -> Result<Vec<String>> {
            match self.0.get(path) {
                Some(text) => Ok(text.split_whitespace().map(str::to_string).collect()),
                None => Err(Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound))),
            }
        }
    }

    fn hit(doc_id: u32, path: &str) -> SearchHit {
        SearchHit { doc_id, path: path.to_string(), score: 0.0 }
    }

    fn weight(q: &Query, term: &str) -> Option<f64> {
        q.terms().iter().find(|t| t.term == term).map(|t| t.weight)
    }

    #[test]
    fn rocchio_single_relevant_doc() {
        let docs = Docs(HashMap::from([("a", "x y y"), ("b", "z")]));
        let mut q = Query::parse("x");
        q.relevance_feedback(
            &[hit(0, "a"), hit(1, "b")],
            &[true, false],
            &docs,
            &FeedbackConfig::default(),
        )
        .unwrap();

        assert!((weight(&q, "x").unwrap() - (0.2 + 0.8)).abs() < 1e-12);
        assert!((weight(&q, "y").unwrap() - 1.6).abs() < 1e-12);
        assert_eq!(weight(&q, "z"), None);
        let order: Vec<&str> = q.terms().iter().map(|t| t.term.as_str()).collect();
        assert_eq!(order, vec!["x", "y"]);
    }

    #[test]
    fn centroid_divides_by_relevant_count() {
        let docs = Docs(HashMap::from([("a", "p"), ("b", "p q")]));
        let mut q = Query::parse("p");
        q.relevance_feedback(&[hit(0, "a"), hit(1, "b")], &[true, true], &docs, &FeedbackConfig::default())
            .unwrap();
        assert!((weight(&q, "p").unwrap() - (0.2 + 0.4 + 0.4)).abs() < 1e-12);
        assert!((weight(&q, "q").unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn only_top_results_are_read() {
        let docs = Docs(HashMap::from([("a", "p"), ("b", "q")]));
        let cfg = FeedbackConfig { top_retrieved_docs: 1, ..FeedbackConfig::default() };
        let mut q = Query::parse("p");
        q.relevance_feedback(&[hit(0, "a"), hit(1, "b")], &[false, true], &docs, &cfg)
            .unwrap();
        assert_eq!(q.terms(), &[QueryTerm::new("p", 0.2)]);
    }

    #[test]
    fn no_relevant_documents_is_an_error() {
        let docs = Docs(HashMap::new());
        let mut q = Query::parse("p");
        let before = q.clone();
        let err = q
            .relevance_feedback(&[hit(0, "a")], &[false], &docs, &FeedbackConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoRelevantDocuments));
        assert_eq!(q, before);
    }

    #[test]
    fn unreadable_document_is_skipped() {
        let docs = Docs(HashMap::new());
        let mut q = Query::parse("p");
        q.relevance_feedback(&[hit(0, "gone")], &[true], &docs, &FeedbackConfig::default())
            .unwrap();
        assert_eq!(q.terms(), &[QueryTerm::new("p", 0.2)]);
    }
}
