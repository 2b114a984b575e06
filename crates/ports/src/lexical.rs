//! Lexical source boundary contract.
//!
//! A lexical source lists stored records (optionally restricted by source
//! type); term scoring happens in the application layer.

use crate::BoxFuture;
use hybrid_rag_domain::{CandidatePayload, CollectionName, DocumentId, SourceTypeFilter};
use hybrid_rag_shared::{RequestContext, Result};

/// Owned scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalScanRequest {
    /// Collection to scan.
    pub collection: CollectionName,
    /// Source-type restriction, applied natively when supported.
    pub filter: Option<SourceTypeFilter>,
    /// Maximum number of records to return.
    pub limit: u32,
}

/// One stored record returned by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalDocument {
    /// Record identity, when the backend supplied one.
    pub id: Option<DocumentId>,
    /// Stored payload.
    pub payload: CandidatePayload,
}

/// Boundary contract for record listing.
pub trait LexicalSourcePort: Send + Sync {
    /// Return true when this source applies `filter` itself.
    fn supports_native_filter(&self) -> bool {
        true
    }

    /// List stored records.
    fn scan(
        &self,
        ctx: &RequestContext,
        request: LexicalScanRequest,
    ) -> BoxFuture<'_, Result<Vec<LexicalDocument>>>;
}
