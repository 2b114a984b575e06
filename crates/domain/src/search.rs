//! Search results, fusion weights, and the deterministic ordering contract.

use crate::{DocumentId, PrimitiveError, SourceType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One fused search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Document identity (not exposed on the wire).
    pub id: DocumentId,
    /// Combined score; higher is better.
    pub score: f32,
    /// Content text, empty when the backend stored none.
    pub text: Box<str>,
    /// Source system.
    pub source_type: SourceType,
    /// Document title, empty when unknown.
    pub source_title: Box<str>,
    /// Canonical URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<Box<str>>,
    /// Path within a repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<Box<str>>,
    /// Repository name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<Box<str>>,
}

/// Per-channel weights for the combined score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionWeights {
    vector: f32,
    lexical: f32,
}

impl FusionWeights {
    /// Default vector weight.
    pub const DEFAULT_VECTOR: f32 = 0.7;
    /// Default lexical weight.
    pub const DEFAULT_LEXICAL: f32 = 0.3;

    /// Validate weights: finite, non-negative, and not both zero.
    pub fn new(vector: f32, lexical: f32) -> Result<Self, PrimitiveError> {
        if !vector.is_finite() || !lexical.is_finite() {
            return Err(PrimitiveError::InvalidFusionWeights {
                reason: "weights must be finite",
            });
        }
        if vector < 0.0 || lexical < 0.0 {
            return Err(PrimitiveError::InvalidFusionWeights {
                reason: "weights must be non-negative",
            });
        }
        if vector == 0.0 && lexical == 0.0 {
            return Err(PrimitiveError::InvalidFusionWeights {
                reason: "at least one weight must be positive",
            });
        }
        Ok(Self { vector, lexical })
    }

    /// Weight applied to vector scores.
    #[must_use]
    pub const fn vector(self) -> f32 {
        self.vector
    }

    /// Weight applied to lexical scores.
    #[must_use]
    pub const fn lexical(self) -> f32 {
        self.lexical
    }

    /// Combined score for a record with optional per-channel scores.
    ///
    /// Returns `None` when neither channel scored the record.
    #[must_use]
    pub fn combine(self, vector: Option<f32>, lexical: Option<f32>) -> Option<f32> {
        match (vector, lexical) {
            (Some(v), Some(l)) => Some(self.vector.mul_add(v, self.lexical * l)),
            (Some(v), None) => Some(self.vector * v),
            (None, Some(l)) => Some(self.lexical * l),
            (None, None) => None,
        }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            vector: Self::DEFAULT_VECTOR,
            lexical: Self::DEFAULT_LEXICAL,
        }
    }
}

/// Sort key of a fused candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionKey {
    /// Combined score.
    pub score: f32,
    /// Vector rank plus lexical rank (missing channel counts as `len + 1`).
    pub rank_sum: usize,
    /// First-seen order across both channels.
    pub discovery: usize,
}

/// Deterministic ordering contract:
/// 1) score (desc)
/// 2) rank sum (asc)
/// 3) discovery order (asc)
#[must_use]
pub fn compare_fused(a: &FusionKey, b: &FusionKey) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.rank_sum.cmp(&b.rank_sum))
        .then_with(|| a.discovery.cmp(&b.discovery))
}
