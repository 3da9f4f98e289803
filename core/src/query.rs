use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTerm {
    pub term: String,
    pub weight: f64,
}

impl QueryTerm {
    pub fn new(term: impl Into<String>, weight: f64) -> Self {
        Self { term: term.into(), weight }
    }
}

/// Ordered list of weighted terms. Weights stay at 1.0 until relevance
/// feedback rewrites the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub(crate) terms: Vec<QueryTerm>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// One unit-weight term per whitespace-separated word.
    pub fn parse(text: &str) -> Self {
        text.split_whitespace().map(|t| QueryTerm::new(t, 1.0)).collect()
    }

    pub fn terms(&self) -> &[QueryTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Manhattan length: the sum of the term weights.
    pub fn length(&self) -> f64 {
        self.terms.iter().map(|t| t.weight).sum()
    }

    pub fn push(&mut self, term: QueryTerm) {
        self.terms.push(term);
    }
}

impl FromIterator<QueryTerm> for Query {
    fn from_iter<I: IntoIterator<Item = QueryTerm>>(iter: I) -> Self {
        Self { terms: iter.into_iter().collect() }
    }
}
