//! Full-text indexing and boolean "any term" retrieval over short documents.
//!
//! Indexing is a single batch pass: documents are tokenized, inverted into
//! term → posting lists and persisted through an [`store::IndexStore`]
//! backend next to a JSON [`docstore::DocumentStore`]. Queries are answered
//! read-only by [`search::Searcher`].

use serde::{Deserialize, Serialize};

pub mod build;
pub mod codec;
pub mod corpus;
pub mod docstore;
pub mod error;
pub mod index;
pub mod persist;
pub mod posting;
pub mod search;
pub mod store;
pub mod tokenizer;

pub use error::{ErrorKind, IndexError, Result};
pub use index::InvertedIndex;

pub type DocId = u32;
pub type Offset = u32;

/// A corpus record. `id` is the document's 0-based position in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Document {
    pub title: String,
    pub text: String,
    pub id: DocId,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { title: title.into(), text: text.into(), id }
    }
}

/// One occurrence of a term: the document and the token rank inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Rank within the document's filtered token stream, not a byte position.
    pub offset: Offset,
}

impl Posting {
    pub fn new(doc_id: DocId, offset: Offset) -> Self {
        Self { doc_id, offset }
    }
}

pub type PostingList = Vec<Posting>;
