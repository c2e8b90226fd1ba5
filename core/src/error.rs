use std::path::PathBuf;

use thiserror::Error;

use crate::DocId;

/// Errors raised while building, persisting or querying an index.
///
/// A term or document that is simply absent from a lookup is not an error;
/// lookups return empty results instead. The one exception is
/// [`IndexError::UnknownDocument`], which signals a caller asking the
/// document store for an id it never handed out.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("ingest error in {path}: {reason}")]
    Ingest { path: PathBuf, reason: String },

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("keyed store error: {0}")]
    Store(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt posting list for term {term:?}: {reason}")]
    CorruptPostings { term: String, reason: String },

    #[error("document {0} is not in the document store")]
    UnknownDocument(DocId),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification used by callers deciding how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Ingest,
    Storage,
    Serialization,
    InvalidRequest,
}

impl IndexError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IndexError::Ingest { .. } => ErrorKind::Ingest,
            IndexError::Io { .. } | IndexError::Store(_) => ErrorKind::Storage,
            IndexError::Serialization(_) | IndexError::CorruptPostings { .. } => {
                ErrorKind::Serialization
            }
            IndexError::UnknownDocument(_) | IndexError::Config(_) => ErrorKind::InvalidRequest,
        }
    }

    /// True when a keyed store could not be opened because another handle in
    /// this or another process still holds its directory lock.
    pub fn is_store_locked(&self) -> bool {
        match self {
            IndexError::Store(sled::Error::Io(e)) => {
                e.kind() == std::io::ErrorKind::WouldBlock || e.to_string().contains("could not acquire lock")
            }
            _ => false,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io { path: path.into(), source }
    }

    pub(crate) fn ingest(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        IndexError::Ingest { path: path.into(), reason: reason.to_string() }
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for IndexError {
    fn from(err: bincode::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
