//! Persistence of the inverted index behind one interface with two
//! interchangeable backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IndexError, Result};
use crate::persist::IndexPaths;
use crate::{InvertedIndex, Posting, PostingList};

mod keyed;
mod snapshot;

pub use keyed::KeyedStore;
pub use snapshot::SnapshotStore;

/// Term-keyed posting storage.
///
/// Stores release their files when dropped. `close` additionally makes
/// written data durable and reports failures doing so; a writer dropped
/// without `close` may lose its writes but never leaves a half-written
/// snapshot behind.
pub trait IndexStore: Send + Sync {
    fn put(&mut self, term: &str, postings: &[Posting]) -> Result<()>;

    /// Postings for `term`, or an empty list when the term is not stored.
    fn get(&self, term: &str) -> Result<PostingList>;

    fn terms(&self) -> Result<Vec<String>>;

    fn close(self: Box<Self>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One sled key per term, value encoded by [`crate::codec`].
    #[default]
    Keyed,
    /// The whole index as one bincode file, loaded whole on open.
    Snapshot,
}

impl Backend {
    /// Opens an empty store for writing, discarding anything already there.
    pub fn create(&self, paths: &IndexPaths) -> Result<Box<dyn IndexStore>> {
        Ok(match self {
            Backend::Keyed => Box::new(KeyedStore::create(paths.keyed_store())?),
            Backend::Snapshot => Box::new(SnapshotStore::create(paths.snapshot())),
        })
    }

    /// Opens an existing store for lookups.
    pub fn open(&self, paths: &IndexPaths) -> Result<Box<dyn IndexStore>> {
        Ok(match self {
            Backend::Keyed => Box::new(KeyedStore::open(paths.keyed_store())?),
            Backend::Snapshot => Box::new(SnapshotStore::open(paths.snapshot())?),
        })
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Keyed => f.write_str("keyed"),
            Backend::Snapshot => f.write_str("snapshot"),
        }
    }
}

impl FromStr for Backend {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keyed" => Ok(Backend::Keyed),
            "snapshot" => Ok(Backend::Snapshot),
            other => Err(IndexError::Config(format!("unknown backend {other:?}"))),
        }
    }
}

pub fn save_index(store: &mut dyn IndexStore, index: &InvertedIndex) -> Result<()> {
    for (term, postings) in index.iter() {
        store.put(term, postings)?;
    }
    Ok(())
}

/// Reads every stored term back into memory.
pub fn load_index(store: &dyn IndexStore) -> Result<InvertedIndex> {
    let mut index = InvertedIndex::new();
    for term in store.terms()? {
        let postings = store.get(&term)?;
        index.set_postings(term, postings);
    }
    Ok(index)
}
