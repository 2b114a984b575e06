//! # hybrid-rag-ports
//!
//! Port traits for the hybrid-rag hexagonal architecture.
//!
//! This crate defines the interfaces between the application layer and the
//! infrastructure adapters. It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod classifier;
pub mod embedding;
pub mod lexical;
pub mod logger;
pub mod vector_store;

pub use classifier::*;
pub use embedding::*;
pub use lexical::*;
pub use logger::*;
pub use vector_store::*;

// Re-export selected domain types used in port signatures, so adapter crates
// can implement ports without directly depending on `hybrid-rag-domain`.
pub use hybrid_rag_domain::{
    CandidatePayload, ChannelHit, CollectionName, DocumentId, ProviderId, QueryIntent,
    SourceType, SourceTypeFilter,
};
