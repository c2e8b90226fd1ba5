use std::collections::BTreeMap;

use crate::error::{IndexError, Result};
use crate::persist::{read_json, write_json, IndexPaths};
use crate::{DocId, Document};

/// Every document of one index build, keyed by id.
///
/// Persisted as a JSON object whose keys are the ids as strings and whose
/// values are `{"Title", "Text", "Id"}` records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocumentStore {
    docs: BTreeMap<DocId, Document>,
}

impl DocumentStore {
    /// Assigns ids by corpus position, starting at 0.
    pub fn from_corpus<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let docs = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (title, text))| {
                let id = i as DocId;
                (id, Document { title, text, id })
            })
            .collect();
        Self { docs }
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.docs.get(&id)
    }

    /// Looks up every id in order. Ids come from an index built over the
    /// same corpus, so a missing one is an error rather than a skip.
    pub fn hydrate(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        ids.iter()
            .map(|id| self.docs.get(id).cloned().ok_or(IndexError::UnknownDocument(*id)))
            .collect()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }

    /// Documents in id order, for tokenization.
    pub fn to_vec(&self) -> Vec<Document> {
        self.docs.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn save(&self, paths: &IndexPaths) -> Result<()> {
        write_json(&paths.documents(), &self.docs, false)
    }

    pub fn load(paths: &IndexPaths) -> Result<Self> {
        let docs: BTreeMap<DocId, Document> = read_json(&paths.documents())?;
        if let Some((key, doc)) = docs.iter().find(|(key, doc)| **key != doc.id) {
            return Err(IndexError::Serialization(format!("document stored under key {key} has id {}", doc.id)));
        }
        Ok(Self { docs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> DocumentStore {
        DocumentStore::from_corpus(vec![
            ("Tokyo".to_string(), "Tokyo is the capital".to_string()),
            ("Osaka".to_string(), "Osaka is a city".to_string()),
        ])
    }

    #[test]
    fn ids_follow_corpus_order() {
        let store = store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap(), &Document::new(1, "Osaka", "Osaka is a city"));
        assert!(store.get(2).is_none());
    }

    #[test]
    fn hydrate_keeps_requested_order() {
        let docs = store().hydrate(&[1, 0]).unwrap();
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 0]);
    }

    #[test]
    fn hydrate_rejects_unknown_ids() {
        assert!(matches!(store().hydrate(&[0, 9]), Err(IndexError::UnknownDocument(9))));
    }

    #[test]
    fn persisted_with_string_keys() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        store().save(&paths).unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(paths.documents()).unwrap()).unwrap();
        assert_eq!(raw["0"]["Title"], "Tokyo");
        assert_eq!(raw["1"]["Id"], 1);

        assert_eq!(DocumentStore::load(&paths).unwrap(), store());
    }

    #[test]
    fn empty_store_round_trips() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        DocumentStore::default().save(&paths).unwrap();
        assert!(DocumentStore::load(&paths).unwrap().is_empty());
    }
}
