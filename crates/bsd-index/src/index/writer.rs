use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::document::IndexDocument;
use super::retry::RetryPolicy;
use super::search_index::{call_blocking, IndexError, SearchIndex};
use crate::bsds::{BucketAssignment, OrgId, UnifiedWasteRecord, WasteDocument};
use crate::config::IndexConfig;

/// Writes unified documents, with their tabs, to the index alias.
pub struct UnionIndexWriter<I> {
    index: Arc<I>,
    alias: String,
    retry: RetryPolicy,
    timeout: Duration,
}

impl<I> UnionIndexWriter<I>
where
    I: SearchIndex + 'static,
{
    pub fn new(index: Arc<I>, config: &IndexConfig) -> Self {
        Self::with_retry(index, config.alias.clone(), RetryPolicy::from_config(config))
            .with_timeout(config.timeout())
    }

    pub fn with_retry(index: Arc<I>, alias: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            index,
            alias: alias.into(),
            retry,
            timeout: IndexConfig::default().timeout(),
        }
    }

    /// Bounds every submit attempt; an attempt that runs over counts as a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Builds the index document from a normalized record and its tabs.
    pub fn write(
        record: UnifiedWasteRecord,
        tabs: BucketAssignment,
        is_return_for: Vec<OrgId>,
    ) -> IndexDocument {
        IndexDocument::from_parts(record, tabs, is_return_for)
    }

    /// Normalizes and classifies a document; the return tab is evaluated at `now`.
    pub fn build(document: &WasteDocument, now: DateTime<Utc>) -> IndexDocument {
        let tabs = document.classify();
        debug!(
            id = document.id(),
            sirets = tabs.sirets().len(),
            "document classified"
        );
        Self::write(document.normalize(), tabs, document.return_org_ids(now))
    }

    /// Full replace of each document, retried on transient index failures.
    pub async fn submit(&self, documents: &[IndexDocument]) -> Result<(), IndexError> {
        if documents.is_empty() {
            return Ok(());
        }

        let batch: Arc<[IndexDocument]> = documents.into();
        self.retry
            .run("index submit", IndexError::is_retryable, || {
                let index = Arc::clone(&self.index);
                let alias = self.alias.clone();
                let batch = Arc::clone(&batch);
                call_blocking(self.timeout, move || index.submit(&alias, &batch))
            })
            .await?;

        info!(alias = %self.alias, count = documents.len(), "documents indexed");
        Ok(())
    }

    /// Indexes one document end to end and returns what was written.
    pub async fn index_document(
        &self,
        document: &WasteDocument,
        now: DateTime<Utc>,
    ) -> Result<IndexDocument, IndexError> {
        let indexed = Self::build(document, now);
        self.submit(std::slice::from_ref(&indexed)).await?;
        Ok(indexed)
    }
}
