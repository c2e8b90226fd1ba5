use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use time::format_description::well_known::Rfc3339;

use crate::docstore::DocumentStore;
use crate::error::{IndexError, Result};
use crate::index::index_documents_parallel;
use crate::persist::{save_meta, IndexPaths, MetaFile, META_VERSION};
use crate::store::{save_index, Backend};
use crate::tokenizer::TokenizerKind;
use crate::InvertedIndex;

/// Where and how an index is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub tokenizer: TokenizerKind,
}

impl IndexConfig {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf(), backend: Backend::default(), tokenizer: TokenizerKind::default() }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: TokenizerKind) -> Self {
        self.tokenizer = tokenizer;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub root: PathBuf,
    pub num_docs: u32,
    pub num_terms: usize,
    pub num_postings: usize,
}

/// Builds the index for `documents` and replaces whatever was at
/// `config.root`.
///
/// Everything is written to a sibling staging directory first and swapped
/// into place at the end, so a failed build leaves the previous index as it
/// was and a successful one never mixes with it.
pub fn build_index(config: &IndexConfig, documents: &DocumentStore) -> Result<BuildReport> {
    let tokenizer = config.tokenizer.build()?;
    let docs = documents.to_vec();
    let index = index_documents_parallel(tokenizer.as_ref(), &docs);
    tracing::info!(num_docs = docs.len(), num_terms = index.len(), "assembled inverted index");

    let root = resolve_root(&config.root)?;
    let staging = sibling(&root, "building")?;
    remove_dir_if_exists(&staging)?;
    let meta = match write_index(&IndexPaths::new(&staging), config, &index, documents) {
        Ok(meta) => meta,
        Err(e) => {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }
    };
    swap_into_place(&staging, &root)?;

    tracing::info!(root = %root.display(), backend = %config.backend, "index build complete");
    Ok(BuildReport {
        root,
        num_docs: meta.num_docs,
        num_terms: meta.num_terms,
        num_postings: meta.num_postings,
    })
}

fn write_index(paths: &IndexPaths, config: &IndexConfig, index: &InvertedIndex, documents: &DocumentStore) -> Result<MetaFile> {
    fs::create_dir_all(&paths.root).map_err(|e| IndexError::io(&paths.root, e))?;

    let mut store = config.backend.create(paths)?;
    save_index(store.as_mut(), index)?;
    store.close()?;

    documents.save(paths)?;

    let meta = MetaFile {
        version: META_VERSION,
        created_at: time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| IndexError::Serialization(format!("formatting build timestamp: {e}")))?,
        num_docs: documents.len() as u32,
        num_terms: index.len(),
        num_postings: index.posting_count(),
        backend: config.backend,
        tokenizer: config.tokenizer,
    };
    save_meta(paths, &meta)?;
    Ok(meta)
}

/// Absolute form of `root` with `.` and `..` folded away, so relative roots
/// such as `.` or `out/..` still have a directory name to derive siblings from.
fn resolve_root(root: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(root).map_err(|e| IndexError::io(root, e))?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

fn sibling(root: &Path, suffix: &str) -> Result<PathBuf> {
    let name = root
        .file_name()
        .ok_or_else(|| IndexError::Config(format!("index root {} has no directory name", root.display())))?;
    let mut sibling_name = name.to_os_string();
    sibling_name.push(format!(".{suffix}"));
    Ok(root.with_file_name(sibling_name))
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| IndexError::io(path, e))?;
    }
    Ok(())
}

fn swap_into_place(staging: &Path, root: &Path) -> Result<()> {
    if !root.exists() {
        return fs::rename(staging, root).map_err(|e| IndexError::io(root, e));
    }
    let previous = sibling(root, "previous")?;
    remove_dir_if_exists(&previous)?;
    fs::rename(root, &previous).map_err(|e| IndexError::io(root, e))?;
    if let Err(e) = fs::rename(staging, root) {
        if let Err(rollback) = fs::rename(&previous, root) {
            tracing::error!(
                previous = %previous.display(),
                root = %root.display(),
                error = %rollback,
                "could not restore previous index"
            );
        }
        return Err(IndexError::io(root, e));
    }
    remove_dir_if_exists(&previous)
}
