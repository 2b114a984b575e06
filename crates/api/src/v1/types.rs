//! API v1 DTO types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters of the `search` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchParamsDto {
    /// Natural-language or keyword query.
    pub query: String,
    /// Restrict results to these sources: `git`, `confluence`, `jira`, `documentation`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_types: Option<Vec<String>>,
    /// Maximum number of results (default 10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub limit: Option<u32>,
}

/// One search hit on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultDto {
    /// Combined score; higher is better.
    pub score: f32,
    /// Content text.
    pub text: String,
    /// Source system label.
    pub source_type: String,
    /// Document title.
    pub source_title: String,
    /// Canonical URL.
    pub source_url: Option<String>,
    /// Path within a repository.
    pub file_path: Option<String>,
    /// Repository name.
    pub repo_name: Option<String>,
}

/// Result of the `search` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponseDto {
    /// Ordered hits.
    pub results: Vec<SearchResultDto>,
}

/// A tool advertised by an offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDto {
    /// Method name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the parameters.
    pub parameters: Value,
}

/// A named bundle of tools and resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingDto {
    /// Stable offering id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Callable tools.
    pub tools: Vec<ToolDto>,
    /// Static resources.
    pub resources: Vec<Value>,
    /// Parameterized resources.
    pub resource_templates: Vec<Value>,
}

/// Result of the `listOfferings` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListOfferingsResponseDto {
    /// Advertised offerings.
    pub offerings: Vec<OfferingDto>,
}
