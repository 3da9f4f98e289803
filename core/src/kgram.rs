//! Character k-gram index over the vocabulary, for approximate term lookup.
//!
//! Every term is padded as `^term$` and each window of `k` characters maps to
//! the ids of the terms containing it. Term ids are handed out sequentially
//! and a term is only ever inserted once, so appending the new id to a k-gram
//! list always keeps that list ascending. [`intersect`] relies on this.

use std::collections::HashMap;

use crate::error::{Error, Result};

pub type TermId = u32;

#[derive(Debug, Clone)]
pub struct KGramIndex {
    k: usize,
    term_to_id: HashMap<String, TermId>,
    id_to_term: Vec<String>,
    index: HashMap<String, Vec<TermId>>,
}

impl KGramIndex {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidKGramLength(k));
        }
        Ok(Self {
            k,
            term_to_id: HashMap::new(),
            id_to_term: Vec::new(),
            index: HashMap::new(),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn num_terms(&self) -> usize {
        self.id_to_term.len()
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.term_to_id.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.id_to_term.get(id as usize).map(String::as_str)
    }

    /// Resolves ids back to terms, skipping unknown ids.
    pub fn terms_for(&self, ids: &[TermId]) -> Vec<&str> {
        ids.iter().filter_map(|&id| self.term(id)).collect()
    }

    /// All k-grams of `^term$`. A term of `n` characters yields `n + 3 - k`
    /// k-grams, or none when that is not positive.
    pub fn kgrams(&self, term: &str) -> Vec<String> {
        let padded: Vec<char> = std::iter::once('^')
            .chain(term.chars())
            .chain(std::iter::once('$'))
            .collect();
        if padded.len() < self.k {
            return Vec::new();
        }
        padded
            .windows(self.k)
            .map(|w| w.iter().collect())
            .collect()
    }

    /// Adds `term` and its k-grams. Inserting a known term is a no-op.
    pub fn insert(&mut self, term: &str) {
        if self.term_to_id.contains_key(term) {
            return;
        }
        let id = self.id_to_term.len() as TermId;
        self.term_to_id.insert(term.to_string(), id);
        self.id_to_term.push(term.to_string());

        for kgram in self.kgrams(term) {
            let ids = self.index.entry(kgram).or_default();
            // A term repeating a k-gram (e.g. "^aa" in "aaaa") reaches here twice.
            if ids.last() != Some(&id) {
                debug_assert!(ids.last().map_or(true, |&last| last < id));
                ids.push(id);
            }
        }
    }

    pub fn postings(&self, kgram: &str) -> Option<&[TermId]> {
        self.index.get(kgram).map(Vec::as_slice)
    }

    /// Ids of the terms containing every one of `kgrams`.
    ///
    /// Fails without partial output if any k-gram has the wrong length. A
    /// k-gram absent from the index empties the result; no k-grams at all
    /// gives an empty result.
    pub fn search(&self, kgrams: &[&str]) -> Result<Vec<TermId>> {
        if let Some(bad) = kgrams.iter().find(|g| g.chars().count() != self.k) {
            let found = bad.chars().count();
            tracing::warn!(kgram = %bad, expected = self.k, found, "k-gram length mismatch");
            return Err(Error::KGramLengthMismatch {
                kgram: bad.to_string(),
                expected: self.k,
                found,
            });
        }

        let mut result: Option<Vec<TermId>> = None;
        for kgram in kgrams {
            let ids = self.postings(kgram).unwrap_or(&[]);
            result = Some(match result {
                None => ids.to_vec(),
                Some(acc) => intersect(&acc, ids),
            });
        }
        let result = result.unwrap_or_default();
        tracing::debug!(kgrams = kgrams.len(), hits = result.len(), "k-gram search");
        Ok(result)
    }
}

/// Merge intersection of two id lists, both ascending.
pub fn intersect(a: &[TermId], b: &[TermId]) -> Vec<TermId> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    out
}
