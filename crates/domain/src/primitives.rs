//! Domain primitives with validated constructors.

use hybrid_rag_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation failures for domain primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// `CollectionName` is empty after trimming.
    EmptyCollectionName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `CollectionName` violates the allowed pattern.
    InvalidCollectionName {
        /// Trimmed collection name that failed validation.
        input: String,
    },
    /// `DocumentId` is empty after trimming.
    InvalidDocumentId {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `ProviderId` is empty or contains characters outside `[a-z0-9_-]`.
    InvalidProviderId {
        /// Raw input.
        input: String,
    },
    /// Source type string is not one of the known values.
    UnknownSourceType {
        /// Raw input.
        input: String,
    },
    /// Intent string is not one of the known values.
    UnknownIntent {
        /// Raw input.
        input: String,
    },
    /// Fusion weights are negative, non-finite, or both zero.
    InvalidFusionWeights {
        /// Human readable reason.
        reason: &'static str,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyCollectionName { .. } | Self::InvalidCollectionName { .. } => {
                ErrorCode::new("domain", "invalid_collection_name")
            },
            Self::InvalidDocumentId { .. } => ErrorCode::new("domain", "invalid_document_id"),
            Self::InvalidProviderId { .. } => ErrorCode::new("domain", "invalid_provider_id"),
            Self::UnknownSourceType { .. } => ErrorCode::new("domain", "unknown_source_type"),
            Self::UnknownIntent { .. } => ErrorCode::new("domain", "unknown_intent"),
            Self::InvalidFusionWeights { .. } => ErrorCode::new("domain", "invalid_fusion_weights"),
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCollectionName { .. } => {
                formatter.write_str("CollectionName must be non-empty")
            },
            Self::InvalidCollectionName { .. } => {
                formatter.write_str("CollectionName must match /^[a-zA-Z][a-zA-Z0-9_-]*$/")
            },
            Self::InvalidDocumentId { .. } => formatter.write_str("DocumentId must be non-empty"),
            Self::InvalidProviderId { input } => {
                write!(formatter, "invalid provider id: {input:?}")
            },
            Self::UnknownSourceType { input } => write!(
                formatter,
                "unknown source type {input:?} (expected git, confluence, jira, or documentation)"
            ),
            Self::UnknownIntent { input } => write!(
                formatter,
                "unknown query intent {input:?} (expected code, documentation, issue, or general)"
            ),
            Self::InvalidFusionWeights { reason } => {
                write!(formatter, "invalid fusion weights: {reason}")
            },
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let mut envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            PrimitiveError::EmptyCollectionName { input_length }
            | PrimitiveError::InvalidDocumentId { input_length } => {
                envelope = envelope.with_metadata("input_length", input_length.to_string());
            },
            PrimitiveError::InvalidCollectionName { input }
            | PrimitiveError::InvalidProviderId { input }
            | PrimitiveError::UnknownSourceType { input }
            | PrimitiveError::UnknownIntent { input } => {
                envelope = envelope.with_metadata("input", input);
            },
            PrimitiveError::InvalidFusionWeights { reason } => {
                envelope = envelope.with_metadata("reason", reason);
            },
        }

        envelope
    }
}

/// Name of a vector collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionName(Box<str>);

impl CollectionName {
    /// Parse a collection name that satisfies the allowlist pattern.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::EmptyCollectionName {
                input_length: raw.len(),
            });
        };

        if !is_valid_collection_name(trimmed) {
            return Err(PrimitiveError::InvalidCollectionName {
                input: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.into()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Opaque identity of one stored content unit.
///
/// Vector stores hand out integer or UUID ids; both are kept as their string
/// form so the two retrieval channels compare equal on the same point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Box<str>);

impl DocumentId {
    /// Parse a `DocumentId` from backend or user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::InvalidDocumentId {
                input_length: raw.len(),
            });
        };

        Ok(Self(trimmed.into()))
    }

    /// Build an id from a numeric point identifier.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self(value.to_string().into_boxed_str())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Stable identifier for an external provider (`openai`, `qdrant`, `memory`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(Box<str>);

impl ProviderId {
    /// Parse a lowercase provider id.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref().trim();
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-');
        if !valid {
            return Err(PrimitiveError::InvalidProviderId {
                input: raw.to_owned(),
            });
        }
        Ok(Self(raw.into()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn trimmed_non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn is_valid_collection_name(input: &str) -> bool {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}
