use std::fs;
use std::io;
use std::path::Path;

use super::IndexStore;
use crate::codec::{decode_postings, encode_postings};
use crate::error::{IndexError, Result};
use crate::{Posting, PostingList};

/// sled database with one key per term.
pub struct KeyedStore {
    db: sled::Db,
}

impl KeyedStore {
    /// Opens a fresh database at `path`, removing any previous one.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|e| IndexError::io(&path, e))?;
        }
        let db = sled::open(&path)?;
        tracing::debug!(path = %path.display(), "created keyed store");
        Ok(Self { db })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // sled would silently create an empty database here.
        if !path.is_dir() {
            return Err(IndexError::io(&path, io::Error::new(io::ErrorKind::NotFound, "keyed store not found")));
        }
        let db = sled::open(&path)?;
        tracing::debug!(path = %path.display(), terms = db.len(), "opened keyed store");
        Ok(Self { db })
    }
}

impl IndexStore for KeyedStore {
    fn put(&mut self, term: &str, postings: &[Posting]) -> Result<()> {
        self.db.insert(term.as_bytes(), encode_postings(postings).into_bytes())?;
        Ok(())
    }

    fn get(&self, term: &str) -> Result<PostingList> {
        match self.db.get(term.as_bytes())? {
            Some(value) => decode_postings(term, &value),
            None => Ok(Vec::new()),
        }
    }

    fn terms(&self) -> Result<Vec<String>> {
        self.db
            .iter()
            .keys()
            .map(|key| {
                let key = key?;
                String::from_utf8(key.to_vec()).map_err(|e| IndexError::Serialization(format!("non-utf8 term key: {e}")))
            })
            .collect()
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
