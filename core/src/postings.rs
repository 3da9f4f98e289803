use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::DocId;

/// Occurrences of one term in one document.
///
/// Identity is the document id alone: two entries for the same document
/// compare equal whatever their positions.
#[derive(Debug, Clone)]
pub struct PostingsEntry {
    pub doc_id: DocId,
    /// Token offsets within the document, unique and ascending.
    pub positions: BTreeSet<u32>,
}

impl PostingsEntry {
    pub fn new(doc_id: DocId) -> Self {
        Self { doc_id, positions: BTreeSet::new() }
    }

    pub fn with_position(doc_id: DocId, position: u32) -> Self {
        let mut entry = Self::new(doc_id);
        entry.positions.insert(position);
        entry
    }

    pub fn with_positions<I: IntoIterator<Item = u32>>(doc_id: DocId, positions: I) -> Self {
        Self { doc_id, positions: positions.into_iter().collect() }
    }

    /// Number of times the term occurs in the document.
    pub fn term_frequency(&self) -> usize {
        self.positions.len()
    }
}

impl PartialEq for PostingsEntry {
    fn eq(&self, other: &Self) -> bool {
        self.doc_id == other.doc_id
    }
}

impl Eq for PostingsEntry {}

impl PartialOrd for PostingsEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PostingsEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.doc_id.cmp(&other.doc_id)
    }
}

/// Postings for a single term, strictly ascending by doc id.
#[derive(Debug, Clone, Default)]
pub struct PostingsList {
    entries: Vec<PostingsEntry>,
}

impl PostingsList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&PostingsEntry> {
        self.entries.get(i)
    }

    pub fn entries(&self) -> &[PostingsEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PostingsEntry> {
        self.entries.iter()
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.entries.iter().map(|e| e.doc_id)
    }

    /// Ordered insert. An entry for a doc id already present has its
    /// positions merged into the existing entry instead of being duplicated.
    pub fn add(&mut self, entry: PostingsEntry) {
        match self.entries.binary_search_by_key(&entry.doc_id, |e| e.doc_id) {
            Ok(i) => self.entries[i].positions.extend(entry.positions),
            Err(i) => self.entries.insert(i, entry),
        }
    }

    /// Adds a single occurrence without allocating a temporary entry when the
    /// document is already present.
    pub fn add_position(&mut self, doc_id: DocId, position: u32) {
        match self.entries.binary_search_by_key(&doc_id, |e| e.doc_id) {
            Ok(i) => {
                self.entries[i].positions.insert(position);
            }
            Err(i) => self.entries.insert(i, PostingsEntry::with_position(doc_id, position)),
        }
    }

    /// Logarithmic membership test on the doc id order.
    pub fn fast_contains(&self, doc_id: DocId) -> bool {
        self.find(doc_id).is_some()
    }

    pub fn find(&self, doc_id: DocId) -> Option<&PostingsEntry> {
        self.entries
            .binary_search_by_key(&doc_id, |e| e.doc_id)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Appends an entry known to sort after every entry already present.
    /// Merge algorithms emit in ascending order, so they skip the search.
    pub(crate) fn push_sorted(&mut self, entry: PostingsEntry) {
        debug_assert!(self.entries.last().map_or(true, |last| last.doc_id < entry.doc_id));
        self.entries.push(entry);
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a PostingsEntry;
    type IntoIter = std::slice::Iter<'a, PostingsEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<PostingsEntry> for PostingsList {
    fn from_iter<I: IntoIterator<Item = PostingsEntry>>(iter: I) -> Self {
        let mut list = PostingsList::new();
        for entry in iter {
            list.add(entry);
        }
        list
    }
}
