//! # hybrid-rag-app
//!
//! Application use cases for hybrid search.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod fusion;
pub mod hybrid_search;
pub mod lexical_search;
pub mod query_expander;
pub mod vector_search;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use fusion::{FusionOutcome, MalformedHit, MalformedReason, fuse};
pub use hybrid_search::{HybridSearchEngine, SearchBackends, SearchRequest, SearchSettings};
pub use lexical_search::{DEFAULT_SCAN_LIMIT, LexicalSearchAdapter, query_terms, term_overlap};
pub use query_expander::{ExpandedQuery, QueryExpander, expand_query, normalize_whitespace};
pub use vector_search::{DEFAULT_VECTOR_DIMENSION, EnsureCollectionOutcome, VectorSearchAdapter};
