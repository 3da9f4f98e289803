//! Boolean and phrase evaluation over postings lists.

use std::cmp::Ordering;

use crate::index::Index;
use crate::postings::{PostingsEntry, PostingsList};
use crate::query::Query;

/// Documents present in both lists. Matching entries are taken from `p1`,
/// positions included.
pub fn intersect(p1: &PostingsList, p2: &PostingsList) -> PostingsList {
    let mut answer = PostingsList::new();
    let (a, b) = (p1.entries(), p2.entries());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].doc_id.cmp(&b[j].doc_id) {
            Ordering::Equal => {
                answer.push_sorted(a[i].clone());
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    answer
}

/// Documents where some position in `p1` is directly followed by a position
/// in `p2`. Each resulting entry holds the matching `p2` positions, so the
/// output can be fed back in as `p1` to extend the phrase by one term.
pub fn positional_intersect(p1: &PostingsList, p2: &PostingsList) -> PostingsList {
    let mut answer = PostingsList::new();
    let (a, b) = (p1.entries(), p2.entries());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].doc_id.cmp(&b[j].doc_id) {
            Ordering::Equal => {
                let next = &b[j].positions;
                let matched: Vec<u32> = a[i]
                    .positions
                    .iter()
                    .filter_map(|&pos| pos.checked_add(1))
                    .filter(|pos| next.contains(pos))
                    .collect();
                if !matched.is_empty() {
                    answer.push_sorted(PostingsEntry::with_positions(a[i].doc_id, matched));
                }
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    answer
}

/// Folds `op` left to right over `lists`. `None` when there is nothing to fold.
pub fn fold_postings<F>(lists: &[&PostingsList], op: F) -> Option<PostingsList>
where
    F: Fn(&PostingsList, &PostingsList) -> PostingsList,
{
    let (first, rest) = lists.split_first()?;
    let mut acc = (*first).clone();
    for list in rest {
        acc = op(&acc, list);
    }
    Some(acc)
}

/// Postings of every query term found in the index, in query order. Terms
/// missing from the index are left out.
pub fn query_postings<'a, I: Index + ?Sized>(index: &'a I, query: &Query) -> Vec<&'a PostingsList> {
    query
        .terms()
        .iter()
        .filter_map(|qt| index.postings(&qt.term))
        .collect()
}

/// Conjunction of all query terms.
pub fn intersection_query<I: Index + ?Sized>(index: &I, query: &Query) -> Option<PostingsList> {
    fold_postings(&query_postings(index, query), intersect)
}

/// Query terms as a contiguous phrase.
pub fn phrase_query<I: Index + ?Sized>(index: &I, query: &Query) -> Option<PostingsList> {
    fold_postings(&query_postings(index, query), positional_intersect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;
    use std::collections::BTreeSet;

    fn list(entries: &[(u32, &[u32])]) -> PostingsList {
        entries
            .iter()
            .map(|(doc, pos)| PostingsEntry::with_positions(*doc, pos.iter().copied()))
            .collect()
    }

    fn doc_set(l: &PostingsList) -> BTreeSet<u32> {
        l.doc_ids().collect()
    }

    #[test]
    fn intersect_is_subset_of_both_and_commutative() {
        let a = list(&[(1, &[0]), (3, &[0]), (5, &[0]), (8, &[0])]);
        let b = list(&[(0, &[0]), (3, &[0]), (8, &[0]), (9, &[0])]);
        let ab = intersect(&a, &b);
        let ba = intersect(&b, &a);
        assert_eq!(doc_set(&ab), BTreeSet::from([3, 8]));
        assert_eq!(doc_set(&ab), doc_set(&ba));
    }

    #[test]
    fn intersect_keeps_first_list_positions() {
        let a = list(&[(2, &[1, 4])]);
        let b = list(&[(2, &[9])]);
        let out = intersect(&a, &b);
        assert_eq!(out.get(0).unwrap().positions, BTreeSet::from([1, 4]));
    }

    #[test]
    fn positional_match_only_on_adjacent_positions() {
        let a = list(&[(0, &[5, 9]), (1, &[3])]);
        let b = list(&[(0, &[6, 20]), (1, &[5])]);
        let out = positional_intersect(&a, &b);
        assert_eq!(doc_set(&out), BTreeSet::from([0]));
        assert_eq!(out.get(0).unwrap().positions, BTreeSet::from([6]));
    }

    fn phrase_index() -> InMemoryIndex {
        let mut idx = InMemoryIndex::new();
        // doc 0: "new york city", doc 1: "york new city", doc 2: "new york times"
        for (doc, text) in ["new york city", "york new city", "new york times"].iter().enumerate() {
            for (pos, term) in text.split(' ').enumerate() {
                idx.insert(term, doc as u32, pos as u32);
            }
        }
        idx
    }

    #[test]
    fn phrase_keeps_only_contiguous_spans() {
        let idx = phrase_index();
        let out = phrase_query(&idx, &Query::parse("new york city")).unwrap();
        assert_eq!(doc_set(&out), BTreeSet::from([0]));
        assert_eq!(out.get(0).unwrap().positions, BTreeSet::from([2]));

        let out = phrase_query(&idx, &Query::parse("new york")).unwrap();
        assert_eq!(doc_set(&out), BTreeSet::from([0, 2]));
    }

    #[test]
    fn intersection_skips_unknown_terms() {
        let idx = phrase_index();
        let out = intersection_query(&idx, &Query::parse("city zebra new")).unwrap();
        assert_eq!(doc_set(&out), BTreeSet::from([0, 1]));
    }

    #[test]
    fn no_known_terms_is_none() {
        let idx = phrase_index();
        assert!(intersection_query(&idx, &Query::parse("zebra")).is_none());
        assert!(phrase_query(&idx, &Query::new()).is_none());
    }
}
