use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use super::export::export_csv;
use super::filter::FilterExpression;
use super::predicate::to_query_body;
use super::translate::translate;
use super::FilterError;
use crate::bsds::{BsdType, WasteDocument};
use crate::config::{AppEnvironment, IndexConfig};
use crate::index::{
    call_blocking, BulkIndexer, IndexAdmin, IndexDocument, IndexError, RebuildOutcome, ReindexError,
    ReindexReport, SearchIndex, UnionIndexWriter,
};
use crate::repository::{BsdRepository, IndexingError};

/// Indexing and registry search on top of a repository and a search index.
pub struct RegistryService<R, I> {
    index: Arc<I>,
    writer: UnionIndexWriter<I>,
    indexer: BulkIndexer<R, I>,
    timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("failed to write registry export: {0}")]
    Export(#[from] csv::Error),
}

impl<R, I> RegistryService<R, I>
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    pub fn new(repository: Arc<R>, index: Arc<I>, config: &IndexConfig) -> Self {
        Self {
            writer: UnionIndexWriter::new(Arc::clone(&index), config),
            indexer: BulkIndexer::new(repository, Arc::clone(&index), config),
            index,
            timeout: config.timeout(),
        }
    }

    pub fn alias(&self) -> &str {
        self.writer.alias()
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Indexes a document supplied by the caller.
    pub async fn index_record(
        &self,
        document: &WasteDocument,
        now: DateTime<Utc>,
    ) -> Result<IndexDocument, IndexingError> {
        Ok(self.writer.index_document(document, now).await?)
    }

    /// Re-reads a document from the repository and indexes it.
    pub async fn reindex_record(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<IndexDocument, IndexingError> {
        self.indexer.index_one(&self.writer, id, now).await
    }

    /// Rebuilds every document behind `target`, or behind the alias when `None`.
    pub async fn reindex_all(
        &self,
        target: Option<&str>,
        bsd_type: Option<BsdType>,
        now: DateTime<Utc>,
    ) -> Result<ReindexReport, ReindexError> {
        let target = target.unwrap_or(self.writer.alias());
        self.indexer.reindex_all(target, bsd_type, now).await
    }

    pub async fn search(
        &self,
        filter: &FilterExpression,
    ) -> Result<Vec<IndexDocument>, RegistryError> {
        let predicates = Arc::new(translate(filter)?);
        let index = Arc::clone(&self.index);
        let alias = self.alias().to_string();
        let query = Arc::clone(&predicates);
        let hits = call_blocking(self.timeout, move || index.search(&alias, &query)).await?;
        info!(predicates = predicates.len(), hits = hits.len(), "registry search");
        Ok(hits)
    }

    /// Query body the filter would send to the search engine.
    pub fn query(&self, filter: &FilterExpression) -> Result<Value, FilterError> {
        Ok(to_query_body(&translate(filter)?))
    }

    pub async fn export<W: Write>(
        &self,
        filter: &FilterExpression,
        writer: W,
    ) -> Result<usize, RegistryError> {
        let hits = self.search(filter).await?;
        Ok(export_csv(&hits, writer)?)
    }
}

impl<R, I> RegistryService<R, I>
where
    R: BsdRepository + 'static,
    I: IndexAdmin + 'static,
{
    /// Rebuilds the alias, in place or into a new versioned index.
    pub async fn rebuild(
        &self,
        environment: AppEnvironment,
        bsd_type: Option<BsdType>,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<RebuildOutcome, ReindexError> {
        self.indexer.rebuild(environment, bsd_type, force, now).await
    }
}
