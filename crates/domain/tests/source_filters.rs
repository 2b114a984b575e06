//! Integration coverage for source-type filters and payload resolution.

use hybrid_rag_domain::{CandidatePayload, SourceType, SourceTypeFilter, passes_filter};
use hybrid_rag_shared::ErrorEnvelope;

#[test]
fn filter_parsing_rejects_unknown_values() {
    let parsed: Result<Vec<SourceType>, _> = ["git", "Jira"]
        .into_iter()
        .map(SourceType::parse_filterable)
        .collect();
    assert_eq!(parsed.ok(), Some(vec![SourceType::Git, SourceType::Jira]));

    let Err(error) = SourceType::parse_filterable("slack") else {
        return;
    };
    let envelope: ErrorEnvelope = error.into();
    assert_eq!(envelope.code.code(), "unknown_source_type");
    assert_eq!(envelope.metadata.get("input"), Some(&"slack".to_string()));
}

#[test]
fn filter_membership_is_order_independent() {
    let a = SourceTypeFilter::from_types([SourceType::Jira, SourceType::Git]);
    let b = SourceTypeFilter::from_types([SourceType::Git, SourceType::Jira]);
    assert_eq!(a, b);
    assert_eq!(a.as_ref().map(SourceTypeFilter::as_strs), Some(vec!["git", "jira"]));

    for source_type in SourceType::FILTERABLE {
        let expected = matches!(source_type, SourceType::Git | SourceType::Jira);
        assert_eq!(passes_filter(a.as_ref(), source_type), expected);
    }
    assert!(!passes_filter(a.as_ref(), SourceType::Unknown));
}

#[test]
fn payload_without_source_type_resolves_to_unknown() {
    let payload = CandidatePayload::default();
    assert_eq!(payload.resolved_source_type(), SourceType::Unknown);

    let payload = CandidatePayload {
        source_type: Some(SourceType::Documentation),
        ..CandidatePayload::default()
    };
    assert_eq!(payload.resolved_source_type(), SourceType::Documentation);
}
