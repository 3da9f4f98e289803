use crate::error::Result;
use crate::index::{DocId, DocMeta, Index};
use crate::kgram::KGramIndex;

/// Feeds token streams into an index, handing out doc ids in arrival order.
#[derive(Debug, Default)]
pub struct Indexer {
    next_doc_id: DocId,
}

impl Indexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts every token with its offset, then registers the document
    /// with its final length.
    pub fn index_document<I, T>(
        &mut self,
        index: &mut I,
        mut kgrams: Option<&mut KGramIndex>,
        path: &str,
        tokens: T,
    ) -> Result<DocId>
    where
        I: Index + ?Sized,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;
        if doc_id % 1000 == 0 {
            tracing::info!(doc_id, "indexed {} documents", doc_id);
        }

        let mut offset: u32 = 0;
        for token in tokens {
            let token = token.as_ref();
            index.insert(token, doc_id, offset);
            if let Some(kg) = kgrams.as_deref_mut() {
                kg.insert(token);
            }
            offset += 1;
        }
        index.register_document(doc_id, DocMeta { path: path.to_string(), length: offset })?;
        Ok(doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;

    #[test]
    fn assigns_dense_ids_and_lengths() {
        let mut idx = InMemoryIndex::new();
        let mut kg = KGramIndex::new(2).unwrap();
        let mut indexer = Indexer::new();
        let a = indexer
            .index_document(&mut idx, Some(&mut kg), "a.txt", ["to", "be", "or", "not", "to", "be"])
            .unwrap();
        let b = indexer.index_document(&mut idx, None, "b.txt", ["be"]).unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(idx.doc(0).unwrap().length, 6);
        assert_eq!(idx.doc(1).unwrap().path, "b.txt");

        let to = idx.postings("to").unwrap().find(0).unwrap();
        assert_eq!(to.positions.iter().copied().collect::<Vec<_>>(), vec![0, 4]);
        assert_eq!(idx.postings("be").unwrap().len(), 2);
        assert_eq!(kg.num_terms(), 4);
    }
}
