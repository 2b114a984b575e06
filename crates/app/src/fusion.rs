//! Identity-keyed fusion of the vector and lexical channels.

use hybrid_rag_domain::{
    CandidateRecord, Channel, ChannelHit, DocumentId, FusionKey, FusionWeights, SearchResult,
    compare_fused,
};
use std::collections::HashMap;

/// Why a channel hit was left out of fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Backend record carried no usable identity.
    MissingId,
    /// Score was NaN or infinite.
    NonFiniteScore,
}

impl MalformedReason {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingId => "missing_id",
            Self::NonFiniteScore => "non_finite_score",
        }
    }
}

/// A skipped channel hit.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedHit {
    /// Channel that produced the hit.
    pub channel: Channel,
    /// 1-based position in the raw channel list.
    pub rank: usize,
    /// Identity, when present.
    pub id: Option<DocumentId>,
    /// Reason for skipping.
    pub reason: MalformedReason,
}

/// Fused results plus the hits that could not be used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FusionOutcome {
    /// Ordered, identity-unique results.
    pub results: Vec<SearchResult>,
    /// Skipped hits.
    pub malformed: Vec<MalformedHit>,
}

/// Merge both channels by identity and order by combined score.
#[must_use]
pub fn fuse(
    vector_hits: Vec<ChannelHit>,
    lexical_hits: Vec<ChannelHit>,
    weights: FusionWeights,
) -> FusionOutcome {
    let vector_len = vector_hits.len();
    let lexical_len = lexical_hits.len();

    let mut records: Vec<CandidateRecord> = Vec::with_capacity(vector_len + lexical_len);
    let mut index: HashMap<DocumentId, usize> = HashMap::new();
    let mut malformed = Vec::new();

    let mut vector_accepted = 0;
    let mut lexical_accepted = 0;
    let channels = [
        (Channel::Vector, vector_hits),
        (Channel::Lexical, lexical_hits),
    ];
    for (channel, hits) in channels {
        // Ranks count only the hits fusion keeps.
        let mut accepted = 0;
        for (position, hit) in hits.into_iter().enumerate() {
            let Some(id) = hit.id else {
                malformed.push(MalformedHit {
                    channel,
                    rank: position + 1,
                    id: None,
                    reason: MalformedReason::MissingId,
                });
                continue;
            };
            if !hit.score.is_finite() {
                malformed.push(MalformedHit {
                    channel,
                    rank: position + 1,
                    id: Some(id),
                    reason: MalformedReason::NonFiniteScore,
                });
                continue;
            }

            let rank = accepted + 1;
            if let Some(slot) = index.get(&id).and_then(|&slot| records.get_mut(slot)) {
                if slot.observe(channel, hit.score, rank, hit.payload) {
                    accepted = rank;
                }
                continue;
            }
            index.insert(id.clone(), records.len());
            let discovery = records.len();
            records.push(CandidateRecord::first_seen(
                id,
                channel,
                hit.score,
                rank,
                discovery,
                hit.payload,
            ));
            accepted = rank;
        }
        match channel {
            Channel::Vector => vector_accepted = accepted,
            Channel::Lexical => lexical_accepted = accepted,
        }
    }

    let mut keyed: Vec<(FusionKey, CandidateRecord)> = records
        .into_iter()
        .filter_map(|record| {
            let score = weights.combine(record.vector_score, record.lexical_score)?;
            let rank_sum = record.vector_rank.unwrap_or(vector_accepted + 1)
                + record.lexical_rank.unwrap_or(lexical_accepted + 1);
            let key = FusionKey {
                score,
                rank_sum,
                discovery: record.discovery,
            };
            Some((key, record))
        })
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare_fused(a, b));

    FusionOutcome {
        results: keyed
            .into_iter()
            .map(|(key, record)| to_search_result(key.score, record))
            .collect(),
        malformed,
    }
}

fn to_search_result(score: f32, record: CandidateRecord) -> SearchResult {
    let source_type = record.payload.resolved_source_type();
    let payload = record.payload;
    SearchResult {
        id: record.id,
        score,
        text: payload.text.unwrap_or_default(),
        source_type,
        source_title: payload.title.unwrap_or_default(),
        source_url: payload.url,
        file_path: payload.file_path,
        repo_name: payload.repo_name,
    }
}
