//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use hybrid_rag_config::{
    RuntimeEnv, ValidatedRuntimeConfig, load_runtime_config_from_path, to_pretty_json,
    to_pretty_toml,
};
use hybrid_rag_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Output format for `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    /// Pretty JSON.
    #[default]
    Json,
    /// Pretty TOML.
    Toml,
}

/// Load and validate the effective config from an env snapshot.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<ValidatedRuntimeConfig> {
    let env = RuntimeEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_runtime_config_from_path(config_path, overrides_json, &env)
}

/// Render a validated config; secrets print as the redaction placeholder.
pub fn render_config(
    config: &ValidatedRuntimeConfig,
    format: ConfigOutputFormat,
) -> InfraResult<String> {
    match format {
        ConfigOutputFormat::Json => to_pretty_json(config),
        ConfigOutputFormat::Toml => to_pretty_toml(config),
    }
}

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    render_config(&config, ConfigOutputFormat::Json)
}
