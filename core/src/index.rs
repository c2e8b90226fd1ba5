use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::posting::build_postings;
use crate::tokenizer::Tokenizer;
use crate::{DocId, Document, Offset, Posting, PostingList};

/// Documents per partial index when assembling in parallel.
const PARTIAL_CHUNK: usize = 256;

/// Term → posting list. Terms are exact surfaces; posting lists keep
/// insertion order (document order, then token order) and are never
/// deduplicated.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    postings: HashMap<String, PostingList>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, term: &str, posting: Posting) {
        match self.postings.get_mut(term) {
            Some(list) => list.push(posting),
            None => {
                self.postings.insert(term.to_string(), vec![posting]);
            }
        }
    }

    /// Appends a whole list for `term` after any postings already present.
    pub fn extend_term(&mut self, term: String, list: PostingList) {
        self.postings.entry(term).or_default().extend(list);
    }

    /// Replaces whatever list `term` had.
    pub fn set_postings(&mut self, term: String, list: PostingList) {
        self.postings.insert(term, list);
    }

    /// Postings for `term`; empty when the term never occurred.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Posting])> {
        self.postings.iter().map(|(t, l)| (t.as_str(), l.as_slice()))
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn posting_count(&self) -> usize {
        self.postings.values().map(Vec::len).sum()
    }

    /// Concatenates `other`'s lists after this index's lists, term by term.
    /// Associative, so partial indexes built over consecutive document
    /// ranges can be merged in any grouping without changing the result.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (term, list) in other.postings {
            self.extend_term(term, list);
        }
    }

    /// True when both indexes hold the same multiset of postings per term.
    pub fn same_postings(&self, other: &InvertedIndex) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.postings.iter().all(|(term, list)| {
            let Some(theirs) = other.postings.get(term) else { return false };
            if list.len() != theirs.len() {
                return false;
            }
            let mut a = list.clone();
            let mut b = theirs.clone();
            a.sort_unstable();
            b.sort_unstable();
            a == b
        })
    }
}

/// Inverts per-document occurrences into an index, in iteration order.
pub fn assemble<I>(documents: I) -> InvertedIndex
where
    I: IntoIterator<Item = (DocId, Vec<(String, Offset)>)>,
{
    let mut index = InvertedIndex::new();
    for (doc_id, occurrences) in documents {
        for (term, offset) in occurrences {
            index.push(&term, Posting::new(doc_id, offset));
        }
    }
    index
}

pub fn index_documents(tokenizer: &dyn Tokenizer, documents: &[Document]) -> InvertedIndex {
    assemble(documents.iter().map(|d| (d.id, build_postings(tokenizer, d))))
}

/// Tokenizes chunks of documents on the rayon pool and merges the partial
/// indexes in document order.
pub fn index_documents_parallel(tokenizer: &dyn Tokenizer, documents: &[Document]) -> InvertedIndex {
    documents
        .par_chunks(PARTIAL_CHUNK)
        .map(|chunk| index_documents(tokenizer, chunk))
        .reduce(InvertedIndex::new, |mut left, right| {
            left.merge(right);
            left
        })
}
