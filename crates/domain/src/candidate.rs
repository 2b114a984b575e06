//! Per-call candidate records produced by the retrieval channels.

use crate::{DocumentId, SourceType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Retrieval channel a hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Dense embedding similarity.
    Vector,
    /// Term overlap.
    Lexical,
}

impl Channel {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Lexical => "lexical",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Stored payload of a document as seen by one channel.
///
/// Every field is optional: backends disagree on what they return, and fusion
/// takes the union across channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePayload {
    /// Content text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Box<str>>,
    /// Source system of the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    /// Document title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Box<str>>,
    /// Canonical URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Box<str>>,
    /// Path within a repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<Box<str>>,
    /// Repository name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<Box<str>>,
}

impl CandidatePayload {
    /// Fill fields that are missing here from `other`; present fields win.
    ///
    /// An `Unknown` source type counts as missing.
    pub fn merge_missing(&mut self, other: Self) {
        fill(&mut self.text, other.text);
        fill(&mut self.title, other.title);
        fill(&mut self.url, other.url);
        fill(&mut self.file_path, other.file_path);
        fill(&mut self.repo_name, other.repo_name);
        let known_here = self
            .source_type
            .is_some_and(|source_type| source_type != SourceType::Unknown);
        if !known_here && other.source_type.is_some() {
            self.source_type = other.source_type;
        }
    }

    /// Resolved source type (`Unknown` when absent).
    #[must_use]
    pub fn resolved_source_type(&self) -> SourceType {
        self.source_type.unwrap_or(SourceType::Unknown)
    }
}

fn fill(slot: &mut Option<Box<str>>, candidate: Option<Box<str>>) {
    let missing = slot.as_deref().is_none_or(|value| value.trim().is_empty());
    if missing {
        if let Some(value) = candidate.filter(|value| !value.trim().is_empty()) {
            *slot = Some(value);
        }
    }
}

/// One scored record returned by a retrieval channel.
///
/// `id` is `None` when the backend record carried no usable identity; fusion
/// skips such hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelHit {
    /// Document identity, when the backend supplied one.
    pub id: Option<DocumentId>,
    /// Channel-native relevance score (higher is better).
    pub score: f32,
    /// Stored payload.
    pub payload: CandidatePayload,
}

impl ChannelHit {
    /// Build a hit with an identity.
    #[must_use]
    pub const fn new(id: DocumentId, score: f32, payload: CandidatePayload) -> Self {
        Self {
            id: Some(id),
            score,
            payload,
        }
    }
}

/// A document after identity-keyed merging of both channels.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// Document identity.
    pub id: DocumentId,
    /// Vector score, if the vector channel found the document.
    pub vector_score: Option<f32>,
    /// Lexical score, if the lexical channel found the document.
    pub lexical_score: Option<f32>,
    /// 1-based rank within the vector channel.
    pub vector_rank: Option<usize>,
    /// 1-based rank within the lexical channel.
    pub lexical_rank: Option<usize>,
    /// Order in which fusion first saw this document.
    pub discovery: usize,
    /// Union of payload fields across channels.
    pub payload: CandidatePayload,
}

impl CandidateRecord {
    /// Start a record from its first channel sighting.
    #[must_use]
    pub fn first_seen(
        id: DocumentId,
        channel: Channel,
        score: f32,
        rank: usize,
        discovery: usize,
        payload: CandidatePayload,
    ) -> Self {
        let mut record = Self {
            id,
            vector_score: None,
            lexical_score: None,
            vector_rank: None,
            lexical_rank: None,
            discovery,
            payload,
        };
        record.set_channel(channel, score, rank);
        record
    }

    /// Record a sighting from `channel` if that channel has not scored it yet.
    ///
    /// Returns false when the channel already reported this document.
    pub fn observe(
        &mut self,
        channel: Channel,
        score: f32,
        rank: usize,
        payload: CandidatePayload,
    ) -> bool {
        let already = match channel {
            Channel::Vector => self.vector_score.is_some(),
            Channel::Lexical => self.lexical_score.is_some(),
        };
        if already {
            return false;
        }
        self.set_channel(channel, score, rank);
        self.payload.merge_missing(payload);
        true
    }

    const fn set_channel(&mut self, channel: Channel, score: f32, rank: usize) {
        match channel {
            Channel::Vector => {
                self.vector_score = Some(score);
                self.vector_rank = Some(rank);
            },
            Channel::Lexical => {
                self.lexical_score = Some(score);
                self.lexical_rank = Some(rank);
            },
        }
    }
}
