//! Search indexing core for waste tracking documents ("bordereaux").
//!
//! Five document types (BSDD, BSDA, BSDASRI, BSFF, BSVHU) are normalized into a single
//! searchable record, classified into per-organization dashboard tabs, and written to a
//! search index. Registry filters are translated into index predicates.

pub mod bsds;
pub mod config;
pub mod error;
pub mod index;
pub mod registry;
pub mod repository;
pub mod telemetry;

pub use bsds::{
    classify, normalize, BsdType, Bucket, BucketAssignment, OrgId, UnifiedWasteRecord,
    WasteDocument,
};
pub use error::AppError;
pub use index::{
    BulkIndexer, InMemoryIndex, IndexDocument, IndexError, ReindexReport, SearchIndex,
    UnionIndexWriter,
};
pub use registry::{
    registry_router, translate, FilterError, FilterExpression, Predicate, RegistryService,
};
pub use repository::{BsdRepository, IndexingError, RepositoryError};
