use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::postings::PostingsList;

pub type DocId = u32;

#[derive(Debug, Clone)]
pub struct DocMeta {
    /// Opaque key the document was indexed under, usually a file path.
    pub path: String,
    /// Number of tokens in the document.
    pub length: u32,
}

impl DocMeta {
    /// Last segment of the path, used as the key into the pagerank table.
    pub fn title(&self) -> &str {
        self.path
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.path)
    }
}

/// Operations every inverted index implementation provides.
pub trait Index {
    /// Records an occurrence of `term` at `offset` in `doc_id`.
    fn insert(&mut self, term: &str, doc_id: DocId, offset: u32);

    /// Postings for `term`, or `None` if the term was never inserted.
    fn postings(&self, term: &str) -> Option<&PostingsList>;

    /// Stores the metadata of a fully tokenized document. Each document is
    /// registered exactly once.
    fn register_document(&mut self, doc_id: DocId, meta: DocMeta) -> Result<()>;

    fn doc(&self, doc_id: DocId) -> Option<&DocMeta>;

    fn num_docs(&self) -> usize;

    /// Called once after an indexing pass, before the first query.
    fn cleanup(&mut self);
}

/// Hash table from terms to postings lists, held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    pub postings: HashMap<String, PostingsList>,
    pub docs: HashMap<DocId, DocMeta>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }
}

impl Index for InMemoryIndex {
    fn insert(&mut self, term: &str, doc_id: DocId, offset: u32) {
        match self.postings.get_mut(term) {
            Some(list) => list.add_position(doc_id, offset),
            None => {
                let mut list = PostingsList::new();
                list.add_position(doc_id, offset);
                self.postings.insert(term.to_string(), list);
            }
        }
    }

    fn postings(&self, term: &str) -> Option<&PostingsList> {
        self.postings.get(term)
    }

    fn register_document(&mut self, doc_id: DocId, meta: DocMeta) -> Result<()> {
        if self.docs.contains_key(&doc_id) {
            return Err(Error::DocumentAlreadyRegistered(doc_id));
        }
        self.docs.insert(doc_id, meta);
        Ok(())
    }

    fn doc(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.docs.get(&doc_id)
    }

    fn num_docs(&self) -> usize {
        self.docs.len()
    }

    fn cleanup(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_creates_and_merges_postings() {
        let mut idx = InMemoryIndex::new();
        idx.insert("cat", 1, 0);
        idx.insert("cat", 0, 3);
        idx.insert("cat", 1, 4);
        let list = idx.postings("cat").unwrap();
        assert_eq!(list.doc_ids().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(list.find(1).unwrap().term_frequency(), 2);
    }

    #[test]
    fn missing_term_is_none() {
        let idx = InMemoryIndex::new();
        assert!(idx.postings("nothing").is_none());
    }

    #[test]
    fn documents_register_once() {
        let mut idx = InMemoryIndex::new();
        let meta = DocMeta { path: "a.txt".into(), length: 3 };
        idx.register_document(0, meta.clone()).unwrap();
        assert!(matches!(idx.register_document(0, meta), Err(Error::DocumentAlreadyRegistered(0))));
        assert_eq!(idx.num_docs(), 1);
    }

    #[test]
    fn title_is_last_path_segment() {
        let unix = DocMeta { path: "data/davis/UC_Davis.f".into(), length: 1 };
        let windows = DocMeta { path: r"C:\data\davis\Elly.f".into(), length: 1 };
        let bare = DocMeta { path: "plain".into(), length: 1 };
        assert_eq!(unix.title(), "UC_Davis.f");
        assert_eq!(windows.title(), "Elly.f");
        assert_eq!(bare.title(), "plain");
    }
}
