use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::docstore::DocumentStore;
use crate::error::Result;
use crate::persist::{load_meta, IndexPaths, MetaFile};
use crate::store::IndexStore;
use crate::tokenizer::Tokenizer;
use crate::{DocId, Document};

/// Result of one query: `hit` always equals `documents.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResponse {
    pub hit: usize,
    pub query: String,
    pub documents: Vec<Document>,
}

/// Read-only query engine over one built index.
pub struct Searcher {
    store: Box<dyn IndexStore>,
    tokenizer: Box<dyn Tokenizer>,
    documents: DocumentStore,
    meta: MetaFile,
}

impl Searcher {
    /// Opens the index at `root` with the backend and tokenizer it was built with.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let paths = IndexPaths::new(root);
        let meta = load_meta(&paths)?;
        let tokenizer = meta.tokenizer.build()?;
        let store = meta.backend.open(&paths)?;
        let documents = DocumentStore::load(&paths)?;
        tracing::info!(
            root = %paths.root.display(),
            backend = %meta.backend,
            num_docs = documents.len(),
            "opened index"
        );
        Ok(Self { store, tokenizer, documents, meta })
    }

    pub fn meta(&self) -> &MetaFile {
        &self.meta
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Ids of documents containing any query term, each id once, in the
    /// order first produced while walking query terms left to right.
    pub fn search(&self, query: &str) -> Result<Vec<DocId>> {
        let mut seen: HashSet<DocId> = HashSet::new();
        let mut result = Vec::new();
        let mut terms = 0usize;
        for token in self.tokenizer.tokenize(query) {
            terms += 1;
            for posting in self.store.get(&token.surface)? {
                if seen.insert(posting.doc_id) {
                    result.push(posting.doc_id);
                }
            }
        }
        tracing::debug!(query, terms, hits = result.len(), "search");
        Ok(result)
    }

    pub fn hydrate(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        self.documents.hydrate(ids)
    }

    pub fn respond(&self, query: &str) -> Result<SearchResponse> {
        let ids = self.search(query)?;
        let documents = self.hydrate(&ids)?;
        Ok(SearchResponse { hit: documents.len(), query: query.to_string(), documents })
    }

    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build_index, IndexConfig};
    use crate::tokenizer::TokenizerKind;
    use tempfile::tempdir;

    #[test]
    fn union_keeps_first_seen_order() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("index");
        // "a" occurs in docs 3 and 1, "b" in docs 1 and 2.
        let docs = DocumentStore::from_corpus(vec![
            ("".to_string(), "x".to_string()),
            ("".to_string(), "b a".to_string()),
            ("".to_string(), "b".to_string()),
            ("".to_string(), "a".to_string()),
        ]);
        let config = IndexConfig::new(&root).with_tokenizer(TokenizerKind::Whitespace);
        build_index(&config, &docs).unwrap();

        let searcher = Searcher::open(&root).unwrap();
        assert_eq!(searcher.search("a").unwrap(), vec![1, 3]);
        assert_eq!(searcher.search("a b").unwrap(), vec![1, 3, 2]);
        assert_eq!(searcher.search("b a").unwrap(), vec![1, 2, 3]);
        assert_eq!(searcher.search("a a a").unwrap(), vec![1, 3]);
    }

    #[test]
    fn response_hit_matches_documents() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("index");
        let docs = DocumentStore::from_corpus(vec![("cat".to_string(), "cat dog".to_string())]);
        build_index(&IndexConfig::new(&root).with_tokenizer(TokenizerKind::Whitespace), &docs).unwrap();

        let searcher = Searcher::open(&root).unwrap();
        let response = searcher.respond("dog").unwrap();
        assert_eq!(response.hit, 1);
        assert_eq!(response.query, "dog");
        assert_eq!(response.documents, vec![Document::new(0, "cat", "cat dog")]);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["Hit"], 1);
        assert_eq!(json["Documents"][0]["Text"], "cat dog");
        searcher.close().unwrap();
    }
}
