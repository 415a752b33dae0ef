use std::time::Duration;

use super::document::IndexDocument;
use crate::registry::Predicate;

/// Search engine boundary. Implementations block; async callers go through [`call_blocking`].
pub trait SearchIndex: Send + Sync {
    /// Replaces each document (keyed by id) under `target`, an alias or a concrete index.
    fn submit(&self, target: &str, documents: &[IndexDocument]) -> Result<(), IndexError>;

    /// Documents matching every predicate, sorted by `createdAt` ascending then id.
    fn search(
        &self,
        target: &str,
        predicates: &[Predicate],
    ) -> Result<Vec<IndexDocument>, IndexError>;
}

/// Index lifecycle operations used when rebuilding behind an alias.
pub trait IndexAdmin: SearchIndex {
    fn create_index(&self, name: &str) -> Result<(), IndexError>;

    /// Points `alias` at an existing index, replacing any previous target.
    fn point_alias(&self, alias: &str, index: &str) -> Result<(), IndexError>;

    fn alias_target(&self, alias: &str) -> Result<Option<String>, IndexError>;
}

/// Error enumeration for index failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("index unavailable: {0}")]
    Unavailable(String),
    #[error("index call timed out after {0:?}")]
    Timeout(Duration),
    #[error("index or alias `{0}` not found")]
    UnknownTarget(String),
    #[error("index rejected the request: {0}")]
    Rejected(String),
    #[error("index worker failed: {0}")]
    Worker(String),
}

impl IndexError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Runs a blocking index call on the blocking pool, giving up after `timeout`.
///
/// A call that times out keeps running on its thread; its result is discarded.
pub async fn call_blocking<T, F>(timeout: Duration, call: F) -> Result<T, IndexError>
where
    F: FnOnce() -> Result<T, IndexError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(IndexError::Worker(join.to_string())),
        Err(_) => Err(IndexError::Timeout(timeout)),
    }
}
