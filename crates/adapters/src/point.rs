//! Stored point mapping shared by the Qdrant client and the in-memory corpus.
//!
//! Both read the same point shape: an integer or UUID `id` plus a payload
//! object with `content` (or `text`), a top-level `source_type`, and
//! `metadata`.

use hybrid_rag_ports::{CandidatePayload, DocumentId, SourceType};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Map a Qdrant point id (unsigned integer or UUID string).
///
/// UUIDs are normalized to lowercase hyphenated form so the vector and scroll
/// endpoints agree on identity. Anything else yields `None`.
pub fn point_id(value: Option<&Value>) -> Option<DocumentId> {
    match value? {
        Value::Number(number) => number.as_u64().map(DocumentId::from_u64),
        Value::String(raw) => match Uuid::parse_str(raw.trim()) {
            Ok(uuid) => DocumentId::parse(uuid.hyphenated().to_string()).ok(),
            Err(_) => DocumentId::parse(raw).ok(),
        },
        _ => None,
    }
}

/// Map a stored payload onto the channel-neutral candidate payload.
///
/// `content` carries the text, with `text` as a fallback. Descriptive fields
/// (`title`, `url`, `file_path`, `repo_name`) are read from `metadata` first,
/// then from the top level. `source_type` stays top-level since the backend
/// filter matches on it there.
pub fn candidate_payload(payload: Option<&Map<String, Value>>) -> CandidatePayload {
    let Some(payload) = payload else {
        return CandidatePayload::default();
    };
    let metadata = payload.get("metadata").and_then(Value::as_object);
    let nested = |key: &str| {
        metadata
            .and_then(|metadata| string_field(metadata, key))
            .or_else(|| string_field(payload, key))
    };

    CandidatePayload {
        text: string_field(payload, "content").or_else(|| string_field(payload, "text")),
        source_type: payload
            .get("source_type")
            .and_then(Value::as_str)
            .map(|raw| SourceType::from_payload(Some(raw))),
        title: nested("title"),
        url: nested("url"),
        file_path: nested("file_path"),
        repo_name: nested("repo_name"),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<Box<str>> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(Box::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn integer_and_uuid_ids_map_to_document_ids() {
        assert_eq!(
            point_id(Some(&json!(42))).as_ref().map(DocumentId::as_str),
            Some("42")
        );
        assert_eq!(
            point_id(Some(&json!("5C56C793-69F3-4FBF-87E6-C4BF54C28C26")))
                .as_ref()
                .map(DocumentId::as_str),
            Some("5c56c793-69f3-4fbf-87e6-c4bf54c28c26")
        );
        assert_eq!(point_id(Some(&json!(-3))), None);
        assert_eq!(point_id(Some(&json!(null))), None);
        assert_eq!(point_id(None), None);
    }

    #[test]
    fn metadata_title_wins_over_top_level() {
        let payload = object(json!({
            "content": "Rollback steps",
            "source_type": "confluence",
            "title": "top",
            "metadata": { "title": "Runbook", "url": "https://wiki/runbook" }
        }));
        let mapped = candidate_payload(Some(&payload));
        assert_eq!(mapped.text.as_deref(), Some("Rollback steps"));
        assert_eq!(mapped.title.as_deref(), Some("Runbook"));
        assert_eq!(mapped.url.as_deref(), Some("https://wiki/runbook"));
        assert_eq!(mapped.source_type, Some(SourceType::Confluence));
    }

    #[test]
    fn top_level_fields_fill_missing_metadata() {
        let payload = object(json!({
            "content": "fn main() {}",
            "source_type": "slack",
            "title": "main.rs",
            "file_path": "src/main.rs",
            "repo_name": "tools"
        }));
        let mapped = candidate_payload(Some(&payload));
        assert_eq!(mapped.title.as_deref(), Some("main.rs"));
        assert_eq!(mapped.url, None);
        assert_eq!(mapped.source_type, Some(SourceType::Unknown));
        assert_eq!(mapped.file_path.as_deref(), Some("src/main.rs"));
        assert_eq!(mapped.repo_name.as_deref(), Some("tools"));
    }

    #[test]
    fn text_key_and_nested_locations_are_read() {
        let payload = object(json!({
            "text": "Retry the token refresh",
            "source_type": "git",
            "repo_name": "top-level",
            "metadata": { "file_path": "auth/refresh.rs", "repo_name": "gateway" }
        }));
        let mapped = candidate_payload(Some(&payload));
        assert_eq!(mapped.text.as_deref(), Some("Retry the token refresh"));
        assert_eq!(mapped.file_path.as_deref(), Some("auth/refresh.rs"));
        assert_eq!(mapped.repo_name.as_deref(), Some("gateway"));
    }

    #[test]
    fn content_wins_over_text() {
        let payload = object(json!({ "content": "primary", "text": "secondary" }));
        assert_eq!(candidate_payload(Some(&payload)).text.as_deref(), Some("primary"));
    }

    #[test]
    fn missing_payload_is_empty() {
        assert_eq!(candidate_payload(None), CandidatePayload::default());
    }
}
