//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict (invalid values fail fast) and safe (secret values
//! are redacted in error metadata). Prefixed `HRAG_` names win over the bare
//! aliases when both are set.

use crate::schema::{
    DistanceSetting, EmbeddingProviderKind, LogFormat, LogLevelSetting, RuntimeConfig,
    TransportKind, ValidatedRuntimeConfig, VectorStoreProvider,
};
use hybrid_rag_shared::{ErrorCode, ErrorEnvelope, REDACTED, SecretString, is_secret_key};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Env var: HTTP bind host.
pub const ENV_SERVER_HOST: &str = "HRAG_SERVER_HOST";
/// Env var: HTTP bind host (alias).
pub const ENV_SERVER_HOST_ALIAS: &str = "HOST";
/// Env var: HTTP bind port.
pub const ENV_SERVER_PORT: &str = "HRAG_SERVER_PORT";
/// Env var: HTTP bind port (alias).
pub const ENV_SERVER_PORT_ALIAS: &str = "PORT";
/// Env var: log level.
pub const ENV_LOG_LEVEL: &str = "HRAG_LOG_LEVEL";
/// Env var: log level (alias).
pub const ENV_LOG_LEVEL_ALIAS: &str = "LOG_LEVEL";
/// Env var: log format (`text` | `json`).
pub const ENV_LOG_FORMAT: &str = "HRAG_LOG_FORMAT";
/// Env var: transport (`stdio` | `http`).
pub const ENV_TRANSPORT: &str = "HRAG_TRANSPORT";

/// Env var: vector store provider (`qdrant` | `memory`).
pub const ENV_VECTOR_STORE_PROVIDER: &str = "HRAG_VECTOR_STORE_PROVIDER";
/// Env var: Qdrant URL.
pub const ENV_VECTOR_STORE_URL: &str = "HRAG_VECTOR_STORE_URL";
/// Env var: Qdrant URL (alias).
pub const ENV_VECTOR_STORE_URL_ALIAS: &str = "QDRANT_URL";
/// Env var: Qdrant API key (secret).
pub const ENV_VECTOR_STORE_API_AUTH: &str = "HRAG_VECTOR_STORE_API_KEY";
/// Env var: Qdrant API key (alias).
pub const ENV_VECTOR_STORE_API_AUTH_ALIAS: &str = "QDRANT_API_KEY";
/// Env var: collection name.
pub const ENV_COLLECTION_NAME: &str = "HRAG_COLLECTION_NAME";
/// Env var: collection name (alias).
pub const ENV_COLLECTION_NAME_ALIAS: &str = "QDRANT_COLLECTION_NAME";
/// Env var: vector store timeout in milliseconds.
pub const ENV_VECTOR_STORE_TIMEOUT_MS: &str = "HRAG_VECTOR_STORE_TIMEOUT_MS";
/// Env var: dimension for created collections.
pub const ENV_VECTOR_DIMENSION: &str = "HRAG_VECTOR_DIMENSION";
/// Env var: distance for created collections.
pub const ENV_VECTOR_DISTANCE: &str = "HRAG_VECTOR_DISTANCE";
/// Env var: create the collection when missing.
pub const ENV_ENSURE_COLLECTION: &str = "HRAG_ENSURE_COLLECTION";
/// Env var: lexical scan limit.
pub const ENV_SCAN_LIMIT: &str = "HRAG_SCAN_LIMIT";
/// Env var: memory provider seed file.
pub const ENV_SEED_PATH: &str = "HRAG_SEED_PATH";

/// Env var: embedding provider (`openai` | `test`).
pub const ENV_EMBEDDING_PROVIDER: &str = "HRAG_EMBEDDING_PROVIDER";
/// Env var: embedding base URL.
pub const ENV_EMBEDDING_BASE_URL: &str = "HRAG_EMBEDDING_BASE_URL";
/// Env var: embedding API key (secret).
pub const ENV_EMBEDDING_API_AUTH: &str = "HRAG_EMBEDDING_API_KEY";
/// Env var: embedding API key (alias).
pub const ENV_EMBEDDING_API_AUTH_ALIAS: &str = "OPENAI_API_KEY";
/// Env var: embedding model.
pub const ENV_EMBEDDING_MODEL: &str = "HRAG_EMBEDDING_MODEL";
/// Env var: embedding timeout in milliseconds.
pub const ENV_EMBEDDING_TIMEOUT_MS: &str = "HRAG_EMBEDDING_TIMEOUT_MS";
/// Env var: embedding output dimension.
pub const ENV_EMBEDDING_DIMENSION: &str = "HRAG_EMBEDDING_DIMENSION";

/// Env var: enable the intent classifier.
pub const ENV_CLASSIFIER_ENABLED: &str = "HRAG_CLASSIFIER_ENABLED";
/// Env var: classifier base URL.
pub const ENV_CLASSIFIER_BASE_URL: &str = "HRAG_CLASSIFIER_BASE_URL";
/// Env var: classifier API key (secret).
pub const ENV_CLASSIFIER_API_AUTH: &str = "HRAG_CLASSIFIER_API_KEY";
/// Env var: classifier model.
pub const ENV_CLASSIFIER_MODEL: &str = "HRAG_CLASSIFIER_MODEL";
/// Env var: classifier timeout in milliseconds.
pub const ENV_CLASSIFIER_TIMEOUT_MS: &str = "HRAG_CLASSIFIER_TIMEOUT_MS";

/// Env var: default result limit.
pub const ENV_SEARCH_DEFAULT_LIMIT: &str = "HRAG_SEARCH_DEFAULT_LIMIT";
/// Env var: maximum result limit.
pub const ENV_SEARCH_MAX_LIMIT: &str = "HRAG_SEARCH_MAX_LIMIT";
/// Env var: vector score weight.
pub const ENV_SEARCH_VECTOR_WEIGHT: &str = "HRAG_SEARCH_VECTOR_WEIGHT";
/// Env var: lexical score weight.
pub const ENV_SEARCH_LEXICAL_WEIGHT: &str = "HRAG_SEARCH_LEXICAL_WEIGHT";
/// Env var: vector score threshold.
pub const ENV_SEARCH_SCORE_THRESHOLD: &str = "HRAG_SEARCH_SCORE_THRESHOLD";
/// Env var: candidate pool factor.
pub const ENV_SEARCH_CANDIDATE_POOL_FACTOR: &str = "HRAG_SEARCH_CANDIDATE_POOL_FACTOR";
/// Env var: search timeout in milliseconds.
pub const ENV_SEARCH_TIMEOUT_MS: &str = "HRAG_SEARCH_TIMEOUT_MS";

/// Every env var the runtime config reads, aliases included.
pub const RUNTIME_ENV_VARS: &[&str] = &[
    ENV_SERVER_HOST,
    ENV_SERVER_HOST_ALIAS,
    ENV_SERVER_PORT,
    ENV_SERVER_PORT_ALIAS,
    ENV_LOG_LEVEL,
    ENV_LOG_LEVEL_ALIAS,
    ENV_LOG_FORMAT,
    ENV_TRANSPORT,
    ENV_VECTOR_STORE_PROVIDER,
    ENV_VECTOR_STORE_URL,
    ENV_VECTOR_STORE_URL_ALIAS,
    ENV_VECTOR_STORE_API_AUTH,
    ENV_VECTOR_STORE_API_AUTH_ALIAS,
    ENV_COLLECTION_NAME,
    ENV_COLLECTION_NAME_ALIAS,
    ENV_VECTOR_STORE_TIMEOUT_MS,
    ENV_VECTOR_DIMENSION,
    ENV_VECTOR_DISTANCE,
    ENV_ENSURE_COLLECTION,
    ENV_SCAN_LIMIT,
    ENV_SEED_PATH,
    ENV_EMBEDDING_PROVIDER,
    ENV_EMBEDDING_BASE_URL,
    ENV_EMBEDDING_API_AUTH,
    ENV_EMBEDDING_API_AUTH_ALIAS,
    ENV_EMBEDDING_MODEL,
    ENV_EMBEDDING_TIMEOUT_MS,
    ENV_EMBEDDING_DIMENSION,
    ENV_CLASSIFIER_ENABLED,
    ENV_CLASSIFIER_BASE_URL,
    ENV_CLASSIFIER_API_AUTH,
    ENV_CLASSIFIER_MODEL,
    ENV_CLASSIFIER_TIMEOUT_MS,
    ENV_SEARCH_DEFAULT_LIMIT,
    ENV_SEARCH_MAX_LIMIT,
    ENV_SEARCH_VECTOR_WEIGHT,
    ENV_SEARCH_LEXICAL_WEIGHT,
    ENV_SEARCH_SCORE_THRESHOLD,
    ENV_SEARCH_CANDIDATE_POOL_FACTOR,
    ENV_SEARCH_TIMEOUT_MS,
];

/// Typed env-derived overrides for `RuntimeConfig`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeEnv {
    /// Override for `server.host`.
    pub server_host: Option<Box<str>>,
    /// Override for `server.port`.
    pub server_port: Option<u16>,
    /// Override for `server.logLevel`.
    pub log_level: Option<LogLevelSetting>,
    /// Override for `server.logFormat`.
    pub log_format: Option<LogFormat>,
    /// Override for `server.transport`.
    pub transport: Option<TransportKind>,

    /// Override for `vectorStore.provider`.
    pub vector_store_provider: Option<VectorStoreProvider>,
    /// Override for `vectorStore.url`.
    pub vector_store_url: Option<Box<str>>,
    /// Override for `vectorStore.apiKey`.
    pub vector_store_api_key: Option<SecretString>,
    /// Override for `vectorStore.collectionName`.
    pub collection_name: Option<Box<str>>,
    /// Override for `vectorStore.timeoutMs`.
    pub vector_store_timeout_ms: Option<u64>,
    /// Override for `vectorStore.vectorDimension`.
    pub vector_dimension: Option<u32>,
    /// Override for `vectorStore.distance`.
    pub vector_distance: Option<DistanceSetting>,
    /// Override for `vectorStore.ensureCollection`.
    pub ensure_collection: Option<bool>,
    /// Override for `vectorStore.scanLimit`.
    pub scan_limit: Option<u32>,
    /// Override for `vectorStore.seedPath`.
    pub seed_path: Option<PathBuf>,

    /// Override for `embedding.provider`.
    pub embedding_provider: Option<EmbeddingProviderKind>,
    /// Override for `embedding.baseUrl`.
    pub embedding_base_url: Option<Box<str>>,
    /// Override for `embedding.apiKey`.
    pub embedding_api_key: Option<SecretString>,
    /// Override for `embedding.model`.
    pub embedding_model: Option<Box<str>>,
    /// Override for `embedding.timeoutMs`.
    pub embedding_timeout_ms: Option<u64>,
    /// Override for `embedding.dimension`.
    pub embedding_dimension: Option<u32>,

    /// Override for `classifier.enabled`.
    pub classifier_enabled: Option<bool>,
    /// Override for `classifier.baseUrl`.
    pub classifier_base_url: Option<Box<str>>,
    /// Override for `classifier.apiKey`.
    pub classifier_api_key: Option<SecretString>,
    /// Override for `classifier.model`.
    pub classifier_model: Option<Box<str>>,
    /// Override for `classifier.timeoutMs`.
    pub classifier_timeout_ms: Option<u64>,

    /// Override for `search.defaultLimit`.
    pub search_default_limit: Option<u32>,
    /// Override for `search.maxLimit`.
    pub search_max_limit: Option<u32>,
    /// Override for `search.vectorWeight`.
    pub search_vector_weight: Option<f32>,
    /// Override for `search.lexicalWeight`.
    pub search_lexical_weight: Option<f32>,
    /// Override for `search.scoreThreshold`.
    pub search_score_threshold: Option<f32>,
    /// Override for `search.candidatePoolFactor`.
    pub search_candidate_pool_factor: Option<u32>,
    /// Override for `search.timeoutMs`.
    pub search_timeout_ms: Option<u64>,
}

impl RuntimeEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            server_host: parse_optional_trimmed_string_any(
                map,
                &[ENV_SERVER_HOST, ENV_SERVER_HOST_ALIAS],
            )?,
            server_port: parse_optional_u16_any(map, &[ENV_SERVER_PORT, ENV_SERVER_PORT_ALIAS])?,
            log_level: parse_optional_enum_any(
                map,
                &[ENV_LOG_LEVEL, ENV_LOG_LEVEL_ALIAS],
                LogLevelSetting::parse,
            )?,
            log_format: parse_optional_enum_any(map, &[ENV_LOG_FORMAT], LogFormat::parse)?,
            transport: parse_optional_enum_any(map, &[ENV_TRANSPORT], TransportKind::parse)?,

            vector_store_provider: parse_optional_enum_any(
                map,
                &[ENV_VECTOR_STORE_PROVIDER],
                VectorStoreProvider::parse,
            )?,
            vector_store_url: parse_optional_url_string_any(
                map,
                &[ENV_VECTOR_STORE_URL, ENV_VECTOR_STORE_URL_ALIAS],
            )?,
            vector_store_api_key: parse_optional_secret_any(
                map,
                &[ENV_VECTOR_STORE_API_AUTH, ENV_VECTOR_STORE_API_AUTH_ALIAS],
            )?,
            collection_name: parse_optional_trimmed_string_any(
                map,
                &[ENV_COLLECTION_NAME, ENV_COLLECTION_NAME_ALIAS],
            )?,
            vector_store_timeout_ms: parse_optional_u64(map, ENV_VECTOR_STORE_TIMEOUT_MS)?,
            vector_dimension: parse_optional_u32(map, ENV_VECTOR_DIMENSION)?,
            vector_distance: parse_optional_enum_any(
                map,
                &[ENV_VECTOR_DISTANCE],
                DistanceSetting::parse,
            )?,
            ensure_collection: parse_optional_bool(map, ENV_ENSURE_COLLECTION)?,
            scan_limit: parse_optional_u32(map, ENV_SCAN_LIMIT)?,
            seed_path: parse_optional_trimmed_string(map, ENV_SEED_PATH)?
                .map(|path| PathBuf::from(path.as_ref())),

            embedding_provider: parse_optional_enum_any(
                map,
                &[ENV_EMBEDDING_PROVIDER],
                EmbeddingProviderKind::parse,
            )?,
            embedding_base_url: parse_optional_url_string(map, ENV_EMBEDDING_BASE_URL)?,
            embedding_api_key: parse_optional_secret_any(
                map,
                &[ENV_EMBEDDING_API_AUTH, ENV_EMBEDDING_API_AUTH_ALIAS],
            )?,
            embedding_model: parse_optional_trimmed_string(map, ENV_EMBEDDING_MODEL)?,
            embedding_timeout_ms: parse_optional_u64(map, ENV_EMBEDDING_TIMEOUT_MS)?,
            embedding_dimension: parse_optional_u32(map, ENV_EMBEDDING_DIMENSION)?,

            classifier_enabled: parse_optional_bool(map, ENV_CLASSIFIER_ENABLED)?,
            classifier_base_url: parse_optional_url_string(map, ENV_CLASSIFIER_BASE_URL)?,
            classifier_api_key: parse_optional_secret_any(map, &[ENV_CLASSIFIER_API_AUTH])?,
            classifier_model: parse_optional_trimmed_string(map, ENV_CLASSIFIER_MODEL)?,
            classifier_timeout_ms: parse_optional_u64(map, ENV_CLASSIFIER_TIMEOUT_MS)?,

            search_default_limit: parse_optional_u32(map, ENV_SEARCH_DEFAULT_LIMIT)?,
            search_max_limit: parse_optional_u32(map, ENV_SEARCH_MAX_LIMIT)?,
            search_vector_weight: parse_optional_f32(map, ENV_SEARCH_VECTOR_WEIGHT)?,
            search_lexical_weight: parse_optional_f32(map, ENV_SEARCH_LEXICAL_WEIGHT)?,
            search_score_threshold: parse_optional_f32(map, ENV_SEARCH_SCORE_THRESHOLD)?,
            search_candidate_pool_factor: parse_optional_u32(
                map,
                ENV_SEARCH_CANDIDATE_POOL_FACTOR,
            )?,
            search_timeout_ms: parse_optional_u64(map, ENV_SEARCH_TIMEOUT_MS)?,
        })
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: RuntimeConfig,
    env: &RuntimeEnv,
) -> Result<ValidatedRuntimeConfig, ErrorEnvelope> {
    let mut config = base;
    apply_server_env_overrides(&mut config, env);
    apply_vector_store_env_overrides(&mut config, env);
    apply_embedding_env_overrides(&mut config, env);
    apply_classifier_env_overrides(&mut config, env);
    apply_search_env_overrides(&mut config, env);

    config.validate_and_normalize().map_err(Into::into)
}

fn apply_server_env_overrides(config: &mut RuntimeConfig, env: &RuntimeEnv) {
    let server = &mut config.server;
    set_clone(&mut server.host, env.server_host.as_ref());
    set_copy(&mut server.port, env.server_port);
    set_copy(&mut server.log_level, env.log_level);
    set_copy(&mut server.log_format, env.log_format);
    set_copy(&mut server.transport, env.transport);
}

fn apply_vector_store_env_overrides(config: &mut RuntimeConfig, env: &RuntimeEnv) {
    let store = &mut config.vector_store;
    set_copy(&mut store.provider, env.vector_store_provider);
    set_clone(&mut store.url, env.vector_store_url.as_ref());
    set_optional(&mut store.api_key, env.vector_store_api_key.as_ref());
    set_clone(&mut store.collection_name, env.collection_name.as_ref());
    set_copy(&mut store.timeout_ms, env.vector_store_timeout_ms);
    set_copy(&mut store.vector_dimension, env.vector_dimension);
    set_copy(&mut store.distance, env.vector_distance);
    set_copy(&mut store.ensure_collection, env.ensure_collection);
    set_copy(&mut store.scan_limit, env.scan_limit);
    set_optional(&mut store.seed_path, env.seed_path.as_ref());
}

fn apply_embedding_env_overrides(config: &mut RuntimeConfig, env: &RuntimeEnv) {
    let embedding = &mut config.embedding;
    set_copy(&mut embedding.provider, env.embedding_provider);
    set_clone(&mut embedding.base_url, env.embedding_base_url.as_ref());
    set_optional(&mut embedding.api_key, env.embedding_api_key.as_ref());
    set_clone(&mut embedding.model, env.embedding_model.as_ref());
    set_copy(&mut embedding.timeout_ms, env.embedding_timeout_ms);
    if env.embedding_dimension.is_some() {
        embedding.dimension = env.embedding_dimension;
    }
}

fn apply_classifier_env_overrides(config: &mut RuntimeConfig, env: &RuntimeEnv) {
    let classifier = &mut config.classifier;
    set_copy(&mut classifier.enabled, env.classifier_enabled);
    set_optional(&mut classifier.base_url, env.classifier_base_url.as_ref());
    set_optional(&mut classifier.api_key, env.classifier_api_key.as_ref());
    set_clone(&mut classifier.model, env.classifier_model.as_ref());
    set_copy(&mut classifier.timeout_ms, env.classifier_timeout_ms);
}

fn apply_search_env_overrides(config: &mut RuntimeConfig, env: &RuntimeEnv) {
    let search = &mut config.search;
    set_copy(&mut search.default_limit, env.search_default_limit);
    set_copy(&mut search.max_limit, env.search_max_limit);
    set_copy(&mut search.vector_weight, env.search_vector_weight);
    set_copy(&mut search.lexical_weight, env.search_lexical_weight);
    if env.search_score_threshold.is_some() {
        search.score_threshold = env.search_score_threshold;
    }
    set_copy(
        &mut search.candidate_pool_factor,
        env.search_candidate_pool_factor,
    );
    set_copy(&mut search.timeout_ms, env.search_timeout_ms);
}

fn set_copy<T: Copy>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn set_clone<T: Clone>(field: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

fn set_optional<T: Clone>(field: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *field = Some(value.clone());
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Float env var had an invalid value.
    InvalidFloat {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidFloat { .. } => ErrorCode::new("config", "invalid_env_float"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_env_url"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } | Self::EmptySecret { var } => {
                write!(formatter, "{var} must be non-empty")
            },
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::InvalidFloat { var, .. } => write!(formatter, "{var} must be a finite number"),
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be a valid URL"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidBool { var, value }
            | EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidFloat { var, value }
            | EnvParseError::InvalidUrl { var, value }
            | EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
        }
    }
}

fn first_present(map: &BTreeMap<String, String>, vars: &[&'static str]) -> Option<&'static str> {
    vars.iter().copied().find(|var| map.contains_key(*var))
}

fn non_empty<'a>(
    map: &'a BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<(&'a str, &'a String)>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some((trimmed, raw)))
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    Ok(non_empty(map, var)?.map(|(trimmed, _)| trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_trimmed_string_any(
    map: &BTreeMap<String, String>,
    vars: &[&'static str],
) -> Result<Option<Box<str>>, EnvParseError> {
    first_present(map, vars).map_or(Ok(None), |var| parse_optional_trimmed_string(map, var))
}

fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }

    Ok(Some(SecretString::new(trimmed.to_owned())))
}

fn parse_optional_secret_any(
    map: &BTreeMap<String, String>,
    vars: &[&'static str],
) -> Result<Option<SecretString>, EnvParseError> {
    first_present(map, vars).map_or(Ok(None), |var| parse_optional_secret(map, var))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    non_empty(map, var)?
        .map(|(trimmed, raw)| {
            trimmed.parse::<u64>().map_err(|_| EnvParseError::InvalidInt {
                var,
                value: raw.clone(),
            })
        })
        .transpose()
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    non_empty(map, var)?
        .map(|(trimmed, raw)| {
            trimmed.parse::<u32>().map_err(|_| EnvParseError::InvalidInt {
                var,
                value: raw.clone(),
            })
        })
        .transpose()
}

fn parse_optional_u16_any(
    map: &BTreeMap<String, String>,
    vars: &[&'static str],
) -> Result<Option<u16>, EnvParseError> {
    let Some(var) = first_present(map, vars) else {
        return Ok(None);
    };
    non_empty(map, var)?
        .map(|(trimmed, raw)| {
            trimmed.parse::<u16>().map_err(|_| EnvParseError::InvalidInt {
                var,
                value: raw.clone(),
            })
        })
        .transpose()
}

fn parse_optional_f32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<f32>, EnvParseError> {
    non_empty(map, var)?
        .map(|(trimmed, raw)| {
            trimmed
                .parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| EnvParseError::InvalidFloat {
                    var,
                    value: raw.clone(),
                })
        })
        .transpose()
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some((trimmed, raw)) = non_empty(map, var)? else {
        return Ok(None);
    };

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: raw.clone(),
        }),
    }
}

fn parse_optional_enum_any<T>(
    map: &BTreeMap<String, String>,
    vars: &[&'static str],
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(var) = first_present(map, vars) else {
        return Ok(None);
    };
    non_empty(map, var)?
        .map(|(trimmed, raw)| {
            parse(trimmed).ok_or_else(|| EnvParseError::InvalidEnum {
                var,
                value: raw.clone(),
            })
        })
        .transpose()
}

fn parse_optional_url_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some((trimmed, raw)) = non_empty(map, var)? else {
        return Ok(None);
    };

    let parsed = Url::parse(trimmed).map_err(|_| EnvParseError::InvalidUrl {
        var,
        value: raw.clone(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(EnvParseError::InvalidUrl {
            var,
            value: raw.clone(),
        });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_url_string_any(
    map: &BTreeMap<String, String>,
    vars: &[&'static str],
) -> Result<Option<Box<str>>, EnvParseError> {
    first_present(map, vars).map_or(Ok(None), |var| parse_optional_url_string(map, var))
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
