//! Registry filters: wire format, translation into index predicates, search and export.

pub mod export;
pub mod filter;
pub mod predicate;
pub mod router;
pub mod service;
pub mod translate;

pub use export::export_csv;
pub use filter::{
    DateFilter, FilterExpression, IdFilter, NumericFilter, RangeFilter, StringFilter, TypeFilter,
};
pub use predicate::{to_query_body, Predicate, RangeBound, Scalar};
pub use router::registry_router;
pub use service::{RegistryError, RegistryService};
pub use translate::translate;

/// Invalid registry filter supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("conflicting bounds on `{field}`: `{first}` and `{second}` cannot be combined")]
    ConflictingBounds {
        field: &'static str,
        first: &'static str,
        second: &'static str,
    },
    #[error("malformed filter: {0}")]
    Malformed(String),
}
