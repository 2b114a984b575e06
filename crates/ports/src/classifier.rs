//! Intent classifier boundary contract.

use crate::BoxFuture;
use hybrid_rag_domain::QueryIntent;
use hybrid_rag_shared::{RequestContext, Result};

/// Boundary contract for query intent classification.
///
/// Implementations may fail freely; callers own the fallback.
pub trait IntentClassifierPort: Send + Sync {
    /// Classify `text` into a coarse intent.
    fn classify(&self, ctx: &RequestContext, text: Box<str>) -> BoxFuture<'_, Result<QueryIntent>>;
}
