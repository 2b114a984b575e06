//! JSON Schema exports and the static offering catalog.

use crate::v1::{ListOfferingsResponseDto, OfferingDto, SearchParamsDto, ToolDto};
use schemars::schema_for;
use serde_json::Value;

const OFFERING_ID: &str = "hybrid-rag";
const OFFERING_NAME: &str = "Hybrid RAG Search";
const SEARCH_TOOL_DESCRIPTION: &str = "Search indexed git, confluence, jira, and documentation \
     content by combining semantic similarity with keyword overlap";

/// JSON Schema for `SearchParamsDto`.
#[must_use]
pub fn search_params_schema() -> Value {
    schema_for!(SearchParamsDto).to_value()
}

/// Payload returned by `listOfferings`.
#[must_use]
pub fn list_offerings_response() -> ListOfferingsResponseDto {
    ListOfferingsResponseDto {
        offerings: vec![OfferingDto {
            id: OFFERING_ID.to_string(),
            name: OFFERING_NAME.to_string(),
            version: crate::api_crate_version().to_string(),
            tools: vec![ToolDto {
                name: "search".to_string(),
                description: SEARCH_TOOL_DESCRIPTION.to_string(),
                parameters: search_params_schema(),
            }],
            resources: Vec::new(),
            resource_templates: Vec::new(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_schema_lists_all_parameters() {
        let schema = search_params_schema();
        let properties = &schema["properties"];
        assert!(properties.get("query").is_some());
        assert!(properties.get("source_types").is_some());
        assert!(properties.get("limit").is_some());

        let required = schema["required"].as_array().cloned().unwrap_or_default();
        assert_eq!(required, vec![Value::from("query")]);
    }

    #[test]
    fn offering_catalog_has_one_search_tool() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(list_offerings_response())?;
        let offering = &value["offerings"][0];
        assert_eq!(offering["id"], "hybrid-rag");
        assert_eq!(offering["tools"][0]["name"], "search");
        assert!(offering["resourceTemplates"].as_array().is_some_and(Vec::is_empty));
        Ok(())
    }
}
