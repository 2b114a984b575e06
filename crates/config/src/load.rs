//! Config loading helpers (env + file + overrides).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.
//!
//! File and override layers are merged as JSON values before the typed
//! decode, so an override only touches the keys it names and an explicit
//! `null` clears an optional field.

use crate::{RuntimeConfig, RuntimeEnv, ValidatedRuntimeConfig, apply_env_overrides};
use hybrid_rag_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    const fn label(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

/// Load the runtime config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`RuntimeEnv`)
/// - overrides JSON (partial config)
/// - config JSON (file content)
/// - defaults (`RuntimeConfig::default()`)
pub fn load_runtime_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &RuntimeEnv,
) -> Result<ValidatedRuntimeConfig, ErrorEnvelope> {
    let base = config_json
        .map(|input| parse_layer(input, ConfigFormat::Json, "config"))
        .transpose()?;

    load_layers(base, overrides_json, env)
}

/// Load the runtime config from an optional file path.
pub fn load_runtime_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &RuntimeEnv,
) -> Result<ValidatedRuntimeConfig, ErrorEnvelope> {
    let base = match config_path {
        None => None,
        Some(path) => {
            let config_text = read_config_file(path)?;
            let format = detect_config_format(path)?;
            tracing::debug!(
                path = %path.display(),
                format = format.label(),
                "loaded config file"
            );
            Some(parse_layer(&config_text, format, "config")?)
        },
    };

    load_layers(base, overrides_json, env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
///
/// Secrets serialize as the redaction placeholder.
pub fn to_pretty_json(config: &RuntimeConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &RuntimeConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn load_layers(
    base: Option<Value>,
    overrides_json: Option<&str>,
    env: &RuntimeEnv,
) -> Result<ValidatedRuntimeConfig, ErrorEnvelope> {
    let mut merged = base.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    if let Some(input) = overrides_json {
        let overrides = parse_layer(input, ConfigFormat::Json, "overrides")?;
        merge_values(&mut merged, overrides);
    }

    let config = RuntimeConfig::deserialize(&merged).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid merged config: {error}"),
        )
        .with_metadata("source", "merged")
    })?;

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

/// Parse one layer and check its shape against the schema.
fn parse_layer(
    input: &str,
    format: ConfigFormat,
    source: &'static str,
) -> Result<Value, ErrorEnvelope> {
    let (value, code) = match format {
        ConfigFormat::Json => (
            serde_json::from_str::<Value>(input).map_err(|error| error.to_string()),
            ErrorCode::new("config", "invalid_json"),
        ),
        ConfigFormat::Toml => (
            toml::from_str::<Value>(input).map_err(|error| error.to_string()),
            ErrorCode::new("config", "invalid_toml"),
        ),
    };
    let invalid = |detail: String| {
        ErrorEnvelope::expected(
            code.clone(),
            format!("invalid {source} {}: {detail}", format.label()),
        )
        .with_metadata("source", source)
    };

    let value = value.map_err(&invalid)?;
    if !value.is_object() {
        return Err(invalid("top-level value must be an object".to_string()));
    }
    RuntimeConfig::deserialize(&value).map_err(|error| invalid(error.to_string()))?;

    Ok(value)
}

/// Recursive object merge; non-object values in `overlay` replace `base`.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_values(existing, value);
                    },
                    _ => {
                        base_map.insert(key, value);
                    },
                }
            }
        },
        (slot, value) => *slot = value,
    }
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };
        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}
