//! `search` parameter decoding (shape checks only; limits are enforced by the engine).

use crate::v1::SearchParamsDto;
use hybrid_rag_domain::{SourceType, SourceTypeFilter};
use hybrid_rag_shared::ErrorEnvelope;
use serde_json::{Map, Value};
use std::fmt;

/// Validation failure details for request params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Field name that failed validation (empty when the whole object failed).
    pub field: &'static str,
    /// Human-readable validation error message.
    pub message: Box<str>,
}

impl ValidationIssue {
    fn new(field: &'static str, message: impl Into<Box<str>>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            formatter.write_str(&self.message)
        } else {
            write!(formatter, "{}: {}", self.field, self.message)
        }
    }
}

impl std::error::Error for ValidationIssue {}

impl From<ValidationIssue> for ErrorEnvelope {
    fn from(issue: ValidationIssue) -> Self {
        let field = issue.field;
        let envelope = Self::invalid_input(issue.to_string());
        if field.is_empty() {
            envelope
        } else {
            envelope.with_metadata("field", field)
        }
    }
}

/// Decoded `search` params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSearchParams {
    /// Raw query text.
    pub query: String,
    /// Source restriction; `None` when absent or empty.
    pub source_types: Option<SourceTypeFilter>,
    /// Requested limit.
    pub limit: Option<u32>,
}

/// Decode and shape-check `search` params.
pub fn parse_search_params(
    params: &Map<String, Value>,
) -> Result<ValidatedSearchParams, ValidationIssue> {
    match params.get("query") {
        Some(Value::String(_)) => {},
        Some(_) => return Err(ValidationIssue::new("query", "must be a string")),
        None => return Err(ValidationIssue::new("query", "is required")),
    }

    let dto: SearchParamsDto = serde_json::from_value(Value::Object(params.clone()))
        .map_err(|error| ValidationIssue::new("", error.to_string()))?;

    let source_types = match dto.source_types {
        None => None,
        Some(values) => {
            let parsed = values
                .iter()
                .map(|value| SourceType::parse_filterable(value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| ValidationIssue::new("source_types", error.to_string()))?;
            SourceTypeFilter::from_types(parsed)
        },
    };

    Ok(ValidatedSearchParams {
        query: dto.query,
        source_types,
        limit: dto.limit,
    })
}
