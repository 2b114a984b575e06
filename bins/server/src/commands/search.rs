//! One-shot `search` command.

use crate::CliOutput;
use crate::error::CliError;
use crate::telemetry::init_tracing;
use hybrid_rag_api::v1::search_results_to_response;
use hybrid_rag_app::SearchRequest;
use hybrid_rag_domain::{SourceType, SourceTypeFilter};
use hybrid_rag_infra::{build_logger, load_effective_config, start_engine};
use hybrid_rag_shared::RequestContext;
use std::collections::BTreeMap;
use std::path::Path;

/// Inputs for search command execution.
pub struct SearchCommandInput<'a> {
    pub config_path: Option<&'a Path>,
    pub query: &'a str,
    pub source_types: &'a [String],
    pub limit: Option<u32>,
}

/// Run one query against the configured backends and print the result JSON.
pub async fn run_search(
    env: &BTreeMap<String, String>,
    input: &SearchCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let filter = parse_source_types(input.source_types)?;
    let config = load_effective_config(env, input.config_path, None)?;
    init_tracing(config.server.log_level, config.server.log_format);

    let ctx = RequestContext::new_request();
    let engine = start_engine(&ctx, &config, build_logger(&config)).await?;
    let mut request = SearchRequest::new(input.query).with_source_types(filter);
    if let Some(limit) = input.limit {
        request = request.with_limit(limit);
    }
    let outcome = engine.search(&ctx, request).await;
    engine.shutdown().await;

    let response = search_results_to_response(outcome?);
    let mut stdout = serde_json::to_string_pretty(&response)?;
    stdout.push('\n');
    Ok(CliOutput::stdout(stdout))
}

fn parse_source_types(values: &[String]) -> Result<Option<SourceTypeFilter>, CliError> {
    let types = values
        .iter()
        .map(|value| SourceType::parse_filterable(value))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| CliError::InvalidInput(error.to_string()))?;
    Ok(SourceTypeFilter::from_types(types))
}
