//! Lexical retrieval channel: backend scan plus client-side term scoring.

use crate::vector_search::as_provider_unavailable;
use hybrid_rag_domain::{ChannelHit, CollectionName, SourceTypeFilter, passes_filter};
use hybrid_rag_ports::{LexicalScanRequest, LexicalSourcePort};
use hybrid_rag_shared::{RequestContext, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Default number of records listed per scan.
pub const DEFAULT_SCAN_LIMIT: u32 = 1000;

/// Lexical retrieval channel bound to one collection.
#[derive(Clone)]
pub struct LexicalSearchAdapter {
    source: Arc<dyn LexicalSourcePort>,
    collection: CollectionName,
    scan_limit: u32,
    provider: Box<str>,
}

impl LexicalSearchAdapter {
    /// Bind the adapter to a source and collection.
    #[must_use]
    pub fn new(
        source: Arc<dyn LexicalSourcePort>,
        collection: CollectionName,
        provider: impl Into<Box<str>>,
    ) -> Self {
        Self {
            source,
            collection,
            scan_limit: DEFAULT_SCAN_LIMIT,
            provider: provider.into(),
        }
    }

    /// Override the scan limit.
    #[must_use]
    pub const fn with_scan_limit(mut self, scan_limit: u32) -> Self {
        self.scan_limit = scan_limit;
        self
    }

    /// Score stored records against `query`.
    ///
    /// Zero-score records are dropped; the filter is always re-applied after
    /// the scan; results are sorted by score descending (stable).
    pub async fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        filter: Option<SourceTypeFilter>,
    ) -> Result<Vec<ChannelHit>> {
        ctx.ensure_not_cancelled("lexical_search.search")?;

        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let native_filter = if self.source.supports_native_filter() {
            filter.clone()
        } else {
            None
        };
        let documents = self
            .source
            .scan(
                ctx,
                LexicalScanRequest {
                    collection: self.collection.clone(),
                    filter: native_filter,
                    limit: self.scan_limit,
                },
            )
            .await
            .map_err(|error| as_provider_unavailable(&self.provider, "scan", error))?;

        let mut hits: Vec<ChannelHit> = documents
            .into_iter()
            .filter(|document| {
                passes_filter(filter.as_ref(), document.payload.resolved_source_type())
            })
            .filter_map(|document| {
                let text = document.payload.text.as_deref().unwrap_or_default();
                let score = term_overlap(&terms, text);
                (score > 0.0).then_some(ChannelHit {
                    id: document.id,
                    score,
                    payload: document.payload,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }
}

/// Query terms: lowercased, split on anything but alphanumerics and `_`,
/// de-duplicated in first-seen order.
#[must_use]
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens(query)
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Fraction of `terms` present as tokens of `content`, in `[0, 1]`.
#[must_use]
pub fn term_overlap(terms: &[String], content: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let content_tokens: HashSet<String> = tokens(content).collect();
    let matched = terms
        .iter()
        .filter(|term| content_tokens.contains(*term))
        .count();
    ratio(matched, terms.len())
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

#[allow(
    clippy::cast_precision_loss,
    reason = "term counts are far below f32 mantissa precision"
)]
fn ratio(matched: usize, total: usize) -> f32 {
    matched as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_domain::{CandidatePayload, DocumentId, SourceType};
    use hybrid_rag_ports::{BoxFuture, LexicalDocument};
    use hybrid_rag_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
    use std::sync::Mutex;

    struct FakeSource {
        documents: Vec<LexicalDocument>,
        native_filter: bool,
        fail: bool,
        last_request: Mutex<Option<LexicalScanRequest>>,
    }

    impl FakeSource {
        fn new(documents: Vec<LexicalDocument>) -> Self {
            Self {
                documents,
                native_filter: true,
                fail: false,
                last_request: Mutex::new(None),
            }
        }
    }

    impl LexicalSourcePort for FakeSource {
        fn supports_native_filter(&self) -> bool {
            self.native_filter
        }

        fn scan(
            &self,
            _ctx: &RequestContext,
            request: LexicalScanRequest,
        ) -> BoxFuture<'_, Result<Vec<LexicalDocument>>> {
            if let Ok(mut guard) = self.last_request.lock() {
                *guard = Some(request);
            }
            let outcome = if self.fail {
                Err(ErrorEnvelope::unexpected(
                    ErrorCode::io(),
                    "scroll failed",
                    ErrorClass::Retriable,
                ))
            } else {
                // Deliberately ignores the filter to exercise post-filtering.
                Ok(self.documents.clone())
            };
            Box::pin(async move { outcome })
        }
    }

    fn document(id: &str, text: &str, source_type: SourceType) -> Result<LexicalDocument> {
        Ok(LexicalDocument {
            id: Some(DocumentId::parse(id).map_err(ErrorEnvelope::from)?),
            payload: CandidatePayload {
                text: Some(text.into()),
                source_type: Some(source_type),
                ..CandidatePayload::default()
            },
        })
    }

    fn adapter(source: FakeSource) -> Result<LexicalSearchAdapter> {
        Ok(LexicalSearchAdapter::new(
            Arc::new(source),
            CollectionName::parse("documents").map_err(ErrorEnvelope::from)?,
            "memory",
        ))
    }

    #[test]
    fn query_terms_split_lowercase_and_dedupe() {
        assert_eq!(
            query_terms("Deploy the deploy_script; DEPLOY!"),
            vec!["deploy", "the", "deploy_script"]
        );
        assert!(query_terms("  ... ").is_empty());
    }

    #[test]
    fn term_overlap_matches_whole_tokens() {
        let terms = query_terms("login flow");
        assert!((term_overlap(&terms, "The LOGIN flow works") - 1.0).abs() < f32::EPSILON);
        assert!((term_overlap(&terms, "logins are slow") - 0.0).abs() < f32::EPSILON);
        assert!((term_overlap(&terms, "flow chart") - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn search_scores_drops_zero_and_sorts() -> Result<()> {
        let adapter = adapter(FakeSource::new(vec![
            document("1", "payment service handles refunds", SourceType::Git)?,
            document("2", "unrelated text", SourceType::Git)?,
            document("3", "refunds policy for payment disputes", SourceType::Confluence)?,
            document("4", "payment refunds", SourceType::Jira)?,
        ]))?;

        let ctx = RequestContext::new_request();
        let hits = adapter.search(&ctx, "payment refunds process", None).await?;

        let ids: Vec<_> = hits
            .iter()
            .filter_map(|h| h.id.as_ref().map(DocumentId::as_str))
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert!(hits.iter().all(|h| h.score > 0.0 && h.score <= 1.0));
        Ok(())
    }

    #[tokio::test]
    async fn filter_is_reapplied_after_scan() -> Result<()> {
        let mut source = FakeSource::new(vec![
            document("1", "release notes", SourceType::Git)?,
            document("2", "release checklist", SourceType::Confluence)?,
        ]);
        source.native_filter = false;
        let adapter = adapter(source)?;

        let ctx = RequestContext::new_request();
        let filter = SourceTypeFilter::from_types([SourceType::Confluence]);
        let hits = adapter.search(&ctx, "release", filter).await?;

        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits.first().map(|h| h.payload.resolved_source_type()),
            Some(SourceType::Confluence)
        );
        Ok(())
    }

    #[tokio::test]
    async fn scan_failure_is_provider_unavailable() -> Result<()> {
        let mut source = FakeSource::new(Vec::new());
        source.fail = true;
        let adapter = adapter(source)?;

        let ctx = RequestContext::new_request();
        let error = adapter.search(&ctx, "anything", None).await.err();
        assert!(matches!(
            error,
            Some(ref e) if e.code == ErrorCode::provider_unavailable()
                && e.metadata.get("provider").map(String::as_str) == Some("memory")
        ));
        Ok(())
    }
}
