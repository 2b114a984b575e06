//! Source types, source-type filters, and coarse query intents.

use crate::PrimitiveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Origin system of an indexed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Source code repositories.
    Git,
    /// Confluence pages.
    Confluence,
    /// Jira issues.
    Jira,
    /// Standalone documentation sites and files.
    Documentation,
    /// Payload carried no recognizable source type.
    Unknown,
}

impl SourceType {
    /// Source types a caller may filter on.
    pub const FILTERABLE: [Self; 4] = [Self::Git, Self::Confluence, Self::Jira, Self::Documentation];

    /// Stable wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Confluence => "confluence",
            Self::Jira => "jira",
            Self::Documentation => "documentation",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a caller-supplied filter value.
    ///
    /// `unknown` is not filterable and is rejected along with any other value.
    pub fn parse_filterable(input: &str) -> Result<Self, PrimitiveError> {
        let normalized = input.trim().to_ascii_lowercase();
        Self::FILTERABLE
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| PrimitiveError::UnknownSourceType {
                input: input.to_owned(),
            })
    }

    /// Interpret a stored payload value; anything unrecognized is `Unknown`.
    #[must_use]
    pub fn from_payload(value: Option<&str>) -> Self {
        value
            .and_then(|raw| Self::parse_filterable(raw).ok())
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Non-empty set of source types a search is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceTypeFilter(BTreeSet<SourceType>);

impl SourceTypeFilter {
    /// Build a filter; returns `None` when no types are given (no restriction).
    pub fn from_types(types: impl IntoIterator<Item = SourceType>) -> Option<Self> {
        let set: BTreeSet<SourceType> = types.into_iter().collect();
        if set.is_empty() { None } else { Some(Self(set)) }
    }

    /// Returns true if the source type passes the filter.
    #[must_use]
    pub fn allows(&self, source_type: SourceType) -> bool {
        self.0.contains(&source_type)
    }

    /// Iterate the allowed types in stable order.
    pub fn iter(&self) -> impl Iterator<Item = SourceType> + '_ {
        self.0.iter().copied()
    }

    /// Wire strings of the allowed types, in stable order.
    #[must_use]
    pub fn as_strs(&self) -> Vec<&'static str> {
        self.iter().map(SourceType::as_str).collect()
    }
}

/// Returns true when `source_type` passes an optional filter.
#[must_use]
pub fn passes_filter(filter: Option<&SourceTypeFilter>, source_type: SourceType) -> bool {
    filter.is_none_or(|filter| filter.allows(source_type))
}

/// Coarse category assigned to a query by the intent classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    /// Looking for source code.
    Code,
    /// Looking for prose documentation.
    Documentation,
    /// Looking for tickets, bugs, or tasks.
    Issue,
    /// Anything else; also the classification fallback.
    #[default]
    General,
}

impl QueryIntent {
    /// Stable wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Documentation => "documentation",
            Self::Issue => "issue",
            Self::General => "general",
        }
    }

    /// Parse a classifier label, tolerating case, whitespace, and trailing punctuation.
    pub fn parse(input: &str) -> Result<Self, PrimitiveError> {
        let normalized = input
            .trim()
            .trim_matches(|ch: char| !ch.is_ascii_alphabetic())
            .to_ascii_lowercase();
        match normalized.as_str() {
            "code" => Ok(Self::Code),
            "documentation" | "docs" => Ok(Self::Documentation),
            "issue" | "issues" => Ok(Self::Issue),
            "general" => Ok(Self::General),
            _ => Err(PrimitiveError::UnknownIntent {
                input: input.to_owned(),
            }),
        }
    }
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn filterable_source_types_parse_case_insensitively() -> Result<(), Box<dyn Error>> {
        assert_eq!(SourceType::parse_filterable("GIT")?, SourceType::Git);
        assert_eq!(
            SourceType::parse_filterable(" documentation ")?,
            SourceType::Documentation
        );
        assert!(SourceType::parse_filterable("unknown").is_err());
        assert!(SourceType::parse_filterable("slack").is_err());
        Ok(())
    }

    #[test]
    fn payload_source_type_defaults_to_unknown() {
        assert_eq!(SourceType::from_payload(Some("jira")), SourceType::Jira);
        assert_eq!(SourceType::from_payload(Some("notion")), SourceType::Unknown);
        assert_eq!(SourceType::from_payload(None), SourceType::Unknown);
    }

    #[test]
    fn empty_filter_means_no_restriction() {
        assert!(SourceTypeFilter::from_types([]).is_none());
        assert!(passes_filter(None, SourceType::Unknown));

        let filter = SourceTypeFilter::from_types([SourceType::Git, SourceType::Git]);
        assert!(passes_filter(filter.as_ref(), SourceType::Git));
        assert!(!passes_filter(filter.as_ref(), SourceType::Confluence));
        assert_eq!(filter.map(|f| f.as_strs()), Some(vec!["git"]));
    }

    #[test]
    fn source_type_serializes_lowercase() -> Result<(), Box<dyn Error>> {
        let value = serde_json::to_value(SourceType::Confluence)?;
        assert_eq!(value, serde_json::json!("confluence"));
        Ok(())
    }

    #[test]
    fn intent_parse_tolerates_classifier_noise() -> Result<(), Box<dyn Error>> {
        assert_eq!(QueryIntent::parse(" Code.\n")?, QueryIntent::Code);
        assert_eq!(QueryIntent::parse("\"issue\"")?, QueryIntent::Issue);
        assert_eq!(QueryIntent::parse("docs")?, QueryIntent::Documentation);
        assert!(QueryIntent::parse("").is_err());
        assert!(QueryIntent::parse("weather").is_err());
        assert_eq!(QueryIntent::default(), QueryIntent::General);
        Ok(())
    }
}
