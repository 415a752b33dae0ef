use crate::bsds::{BsdType, WasteDocument};
use crate::index::IndexError;

/// Source of truth for bordereaux, read when (re)indexing.
pub trait BsdRepository: Send + Sync {
    /// Loads a document with everything normalization and classification need.
    fn get_record_for_indexing(&self, id: &str) -> Result<WasteDocument, RepositoryError>;

    /// Identifiers to reindex, optionally restricted to one document type.
    fn list_ids(&self, bsd_type: Option<BsdType>) -> Result<Vec<String>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("bordereau `{0}` not found")]
    NotFound(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Failure of the read, normalize, classify and submit flow for one or more documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexingError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("indexing worker failed: {0}")]
    Worker(String),
}

impl IndexingError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Repository(err) => err.is_retryable(),
            Self::Index(err) => err.is_retryable(),
            Self::Worker(_) => false,
        }
    }
}
