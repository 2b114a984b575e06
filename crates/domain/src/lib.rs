//! # hybrid-rag-domain
//!
//! Domain entities, primitives, and value objects for hybrid search.
//!
//! - **Primitives** - `CollectionName`, `DocumentId`, `ProviderId`
//! - **Source** - `SourceType`, `SourceTypeFilter`, `QueryIntent`
//! - **Candidate** - per-channel hits and fused candidate records
//! - **Search** - `SearchResult`, `FusionWeights`, ordering contract
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use hybrid_rag_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod candidate;
pub mod primitives;
pub mod search;
pub mod source;

pub use candidate::{CandidatePayload, CandidateRecord, Channel, ChannelHit};
pub use primitives::{CollectionName, DocumentId, PrimitiveError, ProviderId};
pub use search::{FusionKey, FusionWeights, SearchResult, compare_fused};
pub use source::{QueryIntent, SourceType, SourceTypeFilter, passes_filter};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_version_matches_shared() {
        assert_eq!(domain_crate_version(), shared_crate_version());
    }
}
