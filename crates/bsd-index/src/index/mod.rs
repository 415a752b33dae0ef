//! Index documents, the search engine boundary, and the writers that feed it.

pub mod document;
pub mod memory;
pub mod naming;
pub mod reindex;
pub mod retry;
pub mod search_index;
pub mod writer;

pub use document::{FieldValue, IndexDocument, IndexField};
pub use memory::InMemoryIndex;
pub use naming::{IndexName, InvalidIndexName, ReindexPlan};
pub use reindex::{BulkIndexer, RebuildOutcome, ReindexError, ReindexReport};
pub use retry::{RetryPolicy, MAX_RETRY_DELAY};
pub use search_index::{call_blocking, IndexAdmin, IndexError, SearchIndex};
pub use writer::UnionIndexWriter;
