use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::IndexStore;
use crate::error::{IndexError, Result};
use crate::{InvertedIndex, Posting, PostingList};

/// Whole-index bincode file. Writes are buffered in memory and land on disk
/// only in [`IndexStore::close`], through a temporary file and a rename.
pub struct SnapshotStore {
    path: PathBuf,
    index: InvertedIndex,
    dirty: bool,
}

impl SnapshotStore {
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        // Dirty from the start so closing an empty writer still replaces the old file.
        Self { path: path.as_ref().to_path_buf(), index: InvertedIndex::new(), dirty: true }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| IndexError::io(&path, e))?;
        let index: InvertedIndex = bincode::deserialize_from(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), terms = index.len(), "loaded snapshot");
        Ok(Self { path, index, dirty: false })
    }

    fn write(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| IndexError::io(dir, e))?;
        }
        let tmp = self.path.with_extension("tmp");
        let file = File::create(&tmp).map_err(|e| IndexError::io(&tmp, e))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &self.index)?;
        writer.flush().map_err(|e| IndexError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| IndexError::io(&self.path, e))?;
        Ok(())
    }
}

impl IndexStore for SnapshotStore {
    fn put(&mut self, term: &str, postings: &[Posting]) -> Result<()> {
        self.index.set_postings(term.to_string(), postings.to_vec());
        self.dirty = true;
        Ok(())
    }

    fn get(&self, term: &str) -> Result<PostingList> {
        Ok(self.index.postings(term).to_vec())
    }

    fn terms(&self) -> Result<Vec<String>> {
        Ok(self.index.terms().map(str::to_string).collect())
    }

    fn close(self: Box<Self>) -> Result<()> {
        if self.dirty {
            self.write()?;
        }
        Ok(())
    }
}
