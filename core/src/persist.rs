use crate::error::{IndexError, Result};
use crate::store::Backend;
use crate::tokenizer::TokenizerKind;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const META_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    pub num_docs: u32,
    pub num_terms: usize,
    pub num_postings: usize,
    pub backend: Backend,
    pub tokenizer: TokenizerKind,
}

/// File layout of one index directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn keyed_store(&self) -> PathBuf { self.root.join("index.sled") }
    pub fn snapshot(&self) -> PathBuf { self.root.join("index.snapshot.bin") }
    pub fn documents(&self) -> PathBuf { self.root.join("documents.json") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir).map_err(|e| IndexError::io(dir, e))?;
    }
    let bytes = if pretty { serde_json::to_vec_pretty(value)? } else { serde_json::to_vec(value)? };
    let mut f = File::create(path).map_err(|e| IndexError::io(path, e))?;
    f.write_all(&bytes).map_err(|e| IndexError::io(path, e))?;
    Ok(())
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let mut f = File::open(path).map_err(|e| IndexError::io(path, e))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(|e| IndexError::io(path, e))?;
    Ok(serde_json::from_slice(&buf)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    write_json(&paths.meta(), meta, true)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let meta: MetaFile = read_json(&paths.meta())?;
    if meta.version > META_VERSION {
        return Err(IndexError::Serialization(format!(
            "index format version {} is newer than supported version {META_VERSION}",
            meta.version
        )));
    }
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn meta(version: u32) -> MetaFile {
        MetaFile {
            version,
            created_at: "2024-01-01T00:00:00Z".into(),
            num_docs: 2,
            num_terms: 5,
            num_postings: 9,
            backend: Backend::Snapshot,
            tokenizer: TokenizerKind::Ngram { n: 2 },
        }
    }

    #[test]
    fn meta_round_trips() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_meta(&paths, &meta(META_VERSION)).unwrap();
        assert_eq!(load_meta(&paths).unwrap(), meta(META_VERSION));
    }

    #[test]
    fn newer_meta_is_rejected() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        save_meta(&paths, &meta(META_VERSION + 1)).unwrap();
        let err = load_meta(&paths).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Serialization);
    }
}
