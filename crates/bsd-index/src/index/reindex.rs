use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::document::IndexDocument;
use super::naming::ReindexPlan;
use super::retry::RetryPolicy;
use super::search_index::{call_blocking, IndexAdmin, IndexError, SearchIndex};
use super::writer::UnionIndexWriter;
use crate::bsds::BsdType;
use crate::config::{AppEnvironment, IndexConfig};
use crate::repository::{BsdRepository, IndexingError, RepositoryError};

/// Outcome of a bulk reindex job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexReport {
    pub chunks: usize,
    pub indexed: usize,
    pub failed_chunks: usize,
    /// Ids that were listed but could not be indexed.
    pub failed_ids: Vec<String>,
}

impl ReindexReport {
    pub fn is_complete(&self) -> bool {
        self.failed_chunks == 0 && self.failed_ids.is_empty()
    }
}

/// Plan followed by [`BulkIndexer::rebuild`] and what the job did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildOutcome {
    pub plan: ReindexPlan,
    pub report: ReindexReport,
    pub alias_switched: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ReindexError {
    #[error("failed to list bordereaux: {0}")]
    Repository(#[from] RepositoryError),
    #[error("index administration failed: {0}")]
    Index(#[from] IndexError),
    #[error("reindex task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Default)]
struct ChunkResult {
    indexed: usize,
    missing: Vec<String>,
}

/// Reads, normalizes, classifies and writes every listed document in chunks.
pub struct BulkIndexer<R, I> {
    repository: Arc<R>,
    index: Arc<I>,
    config: IndexConfig,
    chunk_size: usize,
    concurrency: usize,
    retry: RetryPolicy,
}

impl<R, I> BulkIndexer<R, I>
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    pub fn new(repository: Arc<R>, index: Arc<I>, config: &IndexConfig) -> Self {
        Self {
            repository,
            index,
            config: config.clone(),
            chunk_size: config.chunk_size.max(1),
            concurrency: config.concurrency.max(1),
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Loads one document from the repository and writes it through `writer`.
    pub async fn index_one(
        &self,
        writer: &UnionIndexWriter<I>,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<IndexDocument, IndexingError> {
        let repository = Arc::clone(&self.repository);
        let owned_id = id.to_string();
        let record = tokio::task::spawn_blocking(move || {
            repository.get_record_for_indexing(&owned_id)
        })
        .await
        .map_err(|err| IndexingError::Worker(err.to_string()))??;

        Ok(writer.index_document(&record, now).await?)
    }

    /// Rebuilds `target` (alias or concrete index) from the repository.
    ///
    /// Chunks run concurrently, bounded by the configured concurrency. A failing
    /// chunk is retried on its own; once retries run out its ids are reported as
    /// failed and the job carries on.
    pub async fn reindex_all(
        &self,
        target: &str,
        bsd_type: Option<BsdType>,
        now: DateTime<Utc>,
    ) -> Result<ReindexReport, ReindexError> {
        let repository = Arc::clone(&self.repository);
        let ids = tokio::task::spawn_blocking(move || repository.list_ids(bsd_type)).await??;

        let chunks: Vec<Vec<String>> = ids
            .chunks(self.chunk_size)
            .map(<[String]>::to_vec)
            .collect();
        info!(
            index = target,
            ids = ids.len(),
            chunks = chunks.len(),
            concurrency = self.concurrency,
            "reindex started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let target: Arc<str> = Arc::from(target);
        let mut handles = Vec::with_capacity(chunks.len());

        for (position, chunk) in chunks.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let repository = Arc::clone(&self.repository);
            let index = Arc::clone(&self.index);
            let target = Arc::clone(&target);
            let retry = self.retry;
            let timeout = self.config.timeout();
            let chunk = Arc::new(chunk);

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let outcome = retry
                    .run("reindex chunk", IndexingError::is_retryable, || {
                        let repository = Arc::clone(&repository);
                        let index = Arc::clone(&index);
                        let target = Arc::clone(&target);
                        let chunk = Arc::clone(&chunk);
                        async move {
                            let loaded = tokio::task::spawn_blocking(move || {
                                load_chunk::<R, I>(&*repository, &chunk, now)
                            })
                            .await
                            .map_err(|err| IndexingError::Worker(err.to_string()))??;

                            let indexed = loaded.documents.len();
                            if indexed > 0 {
                                let documents = loaded.documents;
                                call_blocking(timeout, move || index.submit(&target, &documents))
                                    .await?;
                            }
                            Ok::<_, IndexingError>(ChunkResult {
                                indexed,
                                missing: loaded.missing,
                            })
                        }
                    })
                    .await;
                (position, chunk, outcome)
            }));
        }

        let mut report = ReindexReport::default();
        for handle in handles {
            let (position, chunk, outcome) = handle.await?;
            report.chunks += 1;
            match outcome {
                Ok(result) => {
                    info!(chunk = position, indexed = result.indexed, "chunk indexed");
                    report.indexed += result.indexed;
                    report.failed_ids.extend(result.missing);
                }
                Err(error) => {
                    warn!(chunk = position, size = chunk.len(), %error, "chunk failed");
                    report.failed_chunks += 1;
                    report.failed_ids.extend(chunk.iter().cloned());
                }
            }
        }

        info!(
            index = %target,
            indexed = report.indexed,
            failed_chunks = report.failed_chunks,
            failed_ids = report.failed_ids.len(),
            "reindex finished"
        );
        Ok(report)
    }
}

impl<R, I> BulkIndexer<R, I>
where
    R: BsdRepository + 'static,
    I: IndexAdmin + 'static,
{
    /// Rebuilds the documents behind the configured alias.
    ///
    /// Unchanged mappings are reindexed in place. Otherwise a fresh versioned index is
    /// filled and the alias moves to it only when every document made it. A rebuild
    /// restricted to one type always writes in place when the alias exists, so the
    /// other types stay searchable.
    pub async fn rebuild(
        &self,
        environment: AppEnvironment,
        bsd_type: Option<BsdType>,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<RebuildOutcome, ReindexError> {
        let alias = self.config.alias.as_str();
        let timeout = self.config.timeout();
        let current = {
            let index = Arc::clone(&self.index);
            let alias_name = alias.to_string();
            call_blocking(timeout, move || index.alias_target(&alias_name)).await?
        };
        let plan = match (bsd_type, current) {
            (Some(_), Some(index)) => ReindexPlan::InPlace { index },
            (_, current) => {
                ReindexPlan::decide(current.as_deref(), &self.config, environment, force, now)
            }
        };
        let target = plan.target();
        info!(alias, index = %target, ?plan, "rebuild planned");

        if matches!(plan, ReindexPlan::NewIndex { .. }) {
            let index = Arc::clone(&self.index);
            let name = target.clone();
            call_blocking(timeout, move || index.create_index(&name)).await?;
        }
        let report = self.reindex_all(&target, bsd_type, now).await?;

        let alias_switched = match plan {
            ReindexPlan::NewIndex { .. } if report.is_complete() => {
                let index = Arc::clone(&self.index);
                let (alias_name, name) = (alias.to_string(), target.clone());
                call_blocking(timeout, move || index.point_alias(&alias_name, &name)).await?;
                info!(alias, index = %target, "alias switched");
                true
            }
            ReindexPlan::NewIndex { .. } => {
                warn!(alias, index = %target, "incomplete rebuild, alias left unchanged");
                false
            }
            ReindexPlan::InPlace { .. } => false,
        };

        Ok(RebuildOutcome {
            plan,
            report,
            alias_switched,
        })
    }
}

#[derive(Debug, Default)]
struct LoadedChunk {
    documents: Vec<IndexDocument>,
    missing: Vec<String>,
}

/// Reads every record of a chunk and builds its document. Ids gone from the
/// repository are collected rather than failing the chunk.
fn load_chunk<R, I>(
    repository: &R,
    ids: &[String],
    now: DateTime<Utc>,
) -> Result<LoadedChunk, IndexingError>
where
    R: BsdRepository + ?Sized,
    I: SearchIndex + 'static,
{
    let mut loaded = LoadedChunk {
        documents: Vec::with_capacity(ids.len()),
        missing: Vec::new(),
    };

    for id in ids {
        match repository.get_record_for_indexing(id) {
            Ok(record) => loaded.documents.push(UnionIndexWriter::<I>::build(&record, now)),
            Err(RepositoryError::NotFound(missing)) => {
                warn!(id = %missing, "listed bordereau disappeared before indexing");
                loaded.missing.push(missing);
            }
            Err(other) => return Err(other.into()),
        }
    }
    Ok(loaded)
}
