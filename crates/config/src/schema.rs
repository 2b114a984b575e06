//! Runtime configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims string fields and drops blank optionals.

use hybrid_rag_domain::{CollectionName, FusionWeights};
use hybrid_rag_shared::{ErrorCode, ErrorEnvelope, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Strips credentials from a URL before it lands in error metadata.
fn sanitize_url_for_error(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() || !parsed.username().is_empty() {
                if parsed.set_username("").is_err() {
                    return "[invalid url: invalid username]".to_string();
                }
                if parsed.set_password(None).is_err() {
                    return "[invalid url: invalid password]".to_string();
                }
            }
            parsed.to_string()
        },
        Err(error) => format!("[invalid url: {error}]"),
    }
}

const VECTOR_STORE_TIMEOUT_MIN_MS: u64 = 1_000;
const VECTOR_STORE_TIMEOUT_MAX_MS: u64 = 600_000;
const VECTOR_DIMENSION_MIN: u32 = 1;
const VECTOR_DIMENSION_MAX: u32 = 65_536;
const SCAN_LIMIT_MIN: u32 = 1;
const SCAN_LIMIT_MAX: u32 = 100_000;

const EMBEDDING_TIMEOUT_MIN_MS: u64 = 1_000;
const EMBEDDING_TIMEOUT_MAX_MS: u64 = 600_000;

const CLASSIFIER_TIMEOUT_MIN_MS: u64 = 100;
const CLASSIFIER_TIMEOUT_MAX_MS: u64 = 60_000;

const SEARCH_MAX_LIMIT_MIN: u32 = 1;
const SEARCH_MAX_LIMIT_MAX: u32 = 1_000;
const SEARCH_POOL_FACTOR_MIN: u32 = 1;
const SEARCH_POOL_FACTOR_MAX: u32 = 10;
const SEARCH_TIMEOUT_MIN_MS: u64 = 100;
const SEARCH_TIMEOUT_MAX_MS: u64 = 600_000;

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// =============================================================================
// ENUMS
// =============================================================================

macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Accepted labels, in declaration order.
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            /// Stable lowercase label.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Parse a label, case-insensitively.
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                let value = value.trim().to_ascii_lowercase();
                match value.as_str() {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(self.as_str())
            }
        }
    };
}

config_enum! {
    /// Minimum log severity.
    LogLevelSetting {
        /// Debug and above.
        Debug => "debug",
        /// Info and above.
        #[default]
        Info => "info",
        /// Warnings and errors.
        Warn => "warn",
        /// Errors only.
        Error => "error",
    }
}

config_enum! {
    /// Log line format on stderr.
    LogFormat {
        /// Human-readable text.
        #[default]
        Text => "text",
        /// One JSON object per line.
        Json => "json",
    }
}

config_enum! {
    /// Protocol transport served by `serve`.
    TransportKind {
        /// Newline-delimited JSON-RPC on stdin/stdout.
        #[default]
        Stdio => "stdio",
        /// JSON-RPC over HTTP POST.
        Http => "http",
    }
}

config_enum! {
    /// Vector store backend.
    VectorStoreProvider {
        /// Qdrant over REST.
        #[default]
        Qdrant => "qdrant",
        /// In-process corpus seeded from a JSON file.
        Memory => "memory",
    }
}

config_enum! {
    /// Embedding backend.
    EmbeddingProviderKind {
        /// OpenAI-compatible embeddings API.
        #[default]
        Openai => "openai",
        /// Deterministic offline hash embedding.
        Test => "test",
    }
}

config_enum! {
    /// Vector distance metric for created collections.
    DistanceSetting {
        /// Cosine similarity.
        #[default]
        Cosine => "cosine",
        /// Dot product.
        Dot => "dot",
        /// Euclidean distance.
        Euclid => "euclid",
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RuntimeConfig {
    /// Process and transport settings.
    pub server: ServerConfig,
    /// Vector store settings.
    pub vector_store: VectorStoreConfig,
    /// Embedding provider settings.
    pub embedding: EmbeddingConfig,
    /// Intent classifier settings.
    pub classifier: ClassifierConfig,
    /// Search engine tunables.
    pub search: SearchConfig,
}

impl RuntimeConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedRuntimeConfig, ConfigSchemaError> {
        self.server.normalize();
        self.server.validate()?;
        self.vector_store.normalize();
        self.vector_store.validate()?;
        self.embedding.normalize();
        self.embedding.validate()?;
        self.classifier.normalize();
        self.classifier.validate()?;
        self.search.validate()?;

        Ok(ValidatedRuntimeConfig { raw: self })
    }
}

/// Config that passed [`RuntimeConfig::validate_and_normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRuntimeConfig {
    raw: RuntimeConfig,
}

impl ValidatedRuntimeConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &RuntimeConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> RuntimeConfig {
        self.raw
    }

    /// Collection name as a domain value.
    pub fn collection_name(&self) -> Result<CollectionName, ErrorEnvelope> {
        CollectionName::parse(self.raw.vector_store.collection_name.as_ref())
            .map_err(ErrorEnvelope::from)
    }

    /// Fusion weights as a domain value.
    pub fn fusion_weights(&self) -> Result<FusionWeights, ErrorEnvelope> {
        FusionWeights::new(self.raw.search.vector_weight, self.raw.search.lexical_weight)
            .map_err(ErrorEnvelope::from)
    }

    /// Classifier base URL, falling back to the embedding base URL.
    #[must_use]
    pub fn classifier_base_url(&self) -> &str {
        self.raw
            .classifier
            .base_url
            .as_deref()
            .unwrap_or(&self.raw.embedding.base_url)
    }

    /// Classifier API key, falling back to the embedding key.
    #[must_use]
    pub fn classifier_api_key(&self) -> Option<&SecretString> {
        self.raw
            .classifier
            .api_key
            .as_ref()
            .or(self.raw.embedding.api_key.as_ref())
    }
}

impl AsRef<RuntimeConfig> for ValidatedRuntimeConfig {
    fn as_ref(&self) -> &RuntimeConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedRuntimeConfig {
    type Target = RuntimeConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse a runtime config from a JSON string, applying validation and normalization.
pub fn parse_runtime_config_json(input: &str) -> Result<ValidatedRuntimeConfig, ErrorEnvelope> {
    let config: RuntimeConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a runtime config from a TOML string, applying validation and normalization.
pub fn parse_runtime_config_toml(input: &str) -> Result<ValidatedRuntimeConfig, ErrorEnvelope> {
    let config: RuntimeConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Process and transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Bind host for the HTTP transport.
    pub host: Box<str>,
    /// Bind port for the HTTP transport.
    pub port: u16,
    /// Minimum log severity.
    pub log_level: LogLevelSetting,
    /// Log line format.
    pub log_format: LogFormat,
    /// Transport used by `serve`.
    pub transport: TransportKind,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            log_level: LogLevelSetting::default(),
            log_format: LogFormat::default(),
            transport: TransportKind::default(),
        }
    }
}

impl ServerConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.host);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.host.is_empty() {
            return Err(ConfigSchemaError::MissingValue {
                section: "server",
                field: "host",
            });
        }
        if self.port == 0 {
            return Err(ConfigSchemaError::LimitOutOfRange {
                section: "server",
                field: "port",
                value: 0,
                min: 1,
                max: u64::from(u16::MAX),
            });
        }
        Ok(())
    }
}

/// Vector store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct VectorStoreConfig {
    /// Backend selection.
    pub provider: VectorStoreProvider,
    /// Qdrant REST base URL.
    pub url: Box<str>,
    /// Optional Qdrant API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,
    /// Collection holding the documents.
    pub collection_name: Box<str>,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
    /// Dimension used when creating a missing collection.
    pub vector_dimension: u32,
    /// Distance used when creating a missing collection.
    pub distance: DistanceSetting,
    /// Create the collection on startup when missing.
    pub ensure_collection: bool,
    /// Max records listed per lexical scan.
    pub scan_limit: u32,
    /// JSON seed file for the memory provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<PathBuf>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::default(),
            url: "http://localhost:6333".into(),
            api_key: None,
            collection_name: "documents".into(),
            timeout_ms: 30_000,
            vector_dimension: 1536,
            distance: DistanceSetting::default(),
            ensure_collection: true,
            scan_limit: 1_000,
            seed_path: None,
        }
    }
}

impl VectorStoreConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.url);
        normalize_boxed_str(&mut self.collection_name);
        normalize_optional_secret(&mut self.api_key);
        if self
            .seed_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.seed_path = None;
        }
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_http_url("vectorStore", "url", &self.url)?;
        CollectionName::parse(self.collection_name.as_ref()).map_err(|error| {
            ConfigSchemaError::InvalidValue {
                section: "vectorStore",
                field: "collectionName",
                reason: error.to_string(),
            }
        })?;
        validate_timeout_ms(
            "vectorStore",
            "timeoutMs",
            self.timeout_ms,
            VECTOR_STORE_TIMEOUT_MIN_MS,
            VECTOR_STORE_TIMEOUT_MAX_MS,
        )?;
        validate_limit_u32(
            "vectorStore",
            "vectorDimension",
            self.vector_dimension,
            VECTOR_DIMENSION_MIN,
            VECTOR_DIMENSION_MAX,
        )?;
        validate_limit_u32(
            "vectorStore",
            "scanLimit",
            self.scan_limit,
            SCAN_LIMIT_MIN,
            SCAN_LIMIT_MAX,
        )?;
        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EmbeddingConfig {
    /// Backend selection.
    pub provider: EmbeddingProviderKind,
    /// API root (without `/embeddings`).
    pub base_url: Box<str>,
    /// Bearer key for the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,
    /// Embedding model name.
    pub model: Box<str>,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
    /// Optional output dimension sent to the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            base_url: DEFAULT_OPENAI_BASE_URL.into(),
            api_key: None,
            model: "text-embedding-3-small".into(),
            timeout_ms: 30_000,
            dimension: None,
        }
    }
}

impl EmbeddingConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.base_url);
        normalize_boxed_str(&mut self.model);
        normalize_optional_secret(&mut self.api_key);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_http_url("embedding", "baseUrl", &self.base_url)?;
        if self.model.is_empty() {
            return Err(ConfigSchemaError::MissingValue {
                section: "embedding",
                field: "model",
            });
        }
        validate_timeout_ms(
            "embedding",
            "timeoutMs",
            self.timeout_ms,
            EMBEDDING_TIMEOUT_MIN_MS,
            EMBEDDING_TIMEOUT_MAX_MS,
        )?;
        if let Some(dimension) = self.dimension {
            validate_limit_u32(
                "embedding",
                "dimension",
                dimension,
                VECTOR_DIMENSION_MIN,
                VECTOR_DIMENSION_MAX,
            )?;
        }
        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Intent classifier settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ClassifierConfig {
    /// Use the chat-completions classifier.
    pub enabled: bool,
    /// API root; defaults to `embedding.baseUrl`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Box<str>>,
    /// Bearer key; defaults to `embedding.apiKey`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,
    /// Chat model name.
    pub model: Box<str>,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            api_key: None,
            model: "gpt-4o-mini".into(),
            timeout_ms: 5_000,
        }
    }
}

impl ClassifierConfig {
    fn normalize(&mut self) {
        normalize_optional_trimmed(&mut self.base_url);
        normalize_boxed_str(&mut self.model);
        normalize_optional_secret(&mut self.api_key);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if let Some(url) = self.base_url.as_deref() {
            validate_http_url("classifier", "baseUrl", url)?;
        }
        if self.model.is_empty() {
            return Err(ConfigSchemaError::MissingValue {
                section: "classifier",
                field: "model",
            });
        }
        validate_timeout_ms(
            "classifier",
            "timeoutMs",
            self.timeout_ms,
            CLASSIFIER_TIMEOUT_MIN_MS,
            CLASSIFIER_TIMEOUT_MAX_MS,
        )
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Search engine tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SearchConfig {
    /// Limit used when a request gives none.
    pub default_limit: u32,
    /// Largest accepted limit.
    pub max_limit: u32,
    /// Weight of the vector score.
    pub vector_weight: f32,
    /// Weight of the lexical score.
    pub lexical_weight: f32,
    /// Minimum vector similarity; `null` disables the threshold.
    pub score_threshold: Option<f32>,
    /// Per-channel candidates as a multiple of the limit.
    pub candidate_pool_factor: u32,
    /// Deadline for one search call (ms).
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            vector_weight: FusionWeights::DEFAULT_VECTOR,
            lexical_weight: FusionWeights::DEFAULT_LEXICAL,
            score_threshold: Some(0.3),
            candidate_pool_factor: 2,
            timeout_ms: 30_000,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_limit_u32(
            "search",
            "maxLimit",
            self.max_limit,
            SEARCH_MAX_LIMIT_MIN,
            SEARCH_MAX_LIMIT_MAX,
        )?;
        validate_limit_u32("search", "defaultLimit", self.default_limit, 1, self.max_limit)?;
        FusionWeights::new(self.vector_weight, self.lexical_weight).map_err(|error| {
            ConfigSchemaError::InvalidValue {
                section: "search",
                field: "vectorWeight",
                reason: error.to_string(),
            }
        })?;
        if let Some(threshold) = self.score_threshold {
            if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigSchemaError::InvalidValue {
                    section: "search",
                    field: "scoreThreshold",
                    reason: format!("must be within [0, 1] (got {threshold})"),
                });
            }
        }
        validate_limit_u32(
            "search",
            "candidatePoolFactor",
            self.candidate_pool_factor,
            SEARCH_POOL_FACTOR_MIN,
            SEARCH_POOL_FACTOR_MAX,
        )?;
        validate_timeout_ms(
            "search",
            "timeoutMs",
            self.timeout_ms,
            SEARCH_TIMEOUT_MIN_MS,
            SEARCH_TIMEOUT_MAX_MS,
        )
    }

    /// Deadline for one search call.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// A timeout value is out of bounds.
    TimeoutOutOfRange {
        /// Schema section (e.g. `search`).
        section: &'static str,
        /// Field name in the config file (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A numeric limit is out of bounds.
    LimitOutOfRange {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Schema section (e.g. `embedding`).
        section: &'static str,
        /// Field name in the config file (e.g. `baseUrl`).
        field: &'static str,
        /// Invalid URL value.
        url: String,
    },
    /// A required string is blank.
    MissingValue {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
    },
    /// A value failed a domain check.
    InvalidValue {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Human readable reason.
        reason: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "invalid_limit"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
            Self::MissingValue { .. } => ErrorCode::new("config", "missing_value"),
            Self::InvalidValue { .. } => ErrorCode::new("config", "invalid_value"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min_ms}, {max_ms}] ms (got {value_ms})"
            ),
            Self::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min}, {max}] (got {value})"
            ),
            Self::InvalidUrl { section, field, .. } => {
                write!(formatter, "invalid URL for {section}.{field}")
            },
            Self::MissingValue { section, field } => {
                write!(formatter, "{section}.{field} must be non-empty")
            },
            Self::InvalidValue {
                section,
                field,
                reason,
            } => write!(formatter, "invalid value for {section}.{field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidUrl {
                section,
                field,
                url,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", sanitize_url_for_error(&url)),
            ConfigSchemaError::MissingValue { section, field } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field),
            ConfigSchemaError::InvalidValue {
                section,
                field,
                reason,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("reason", reason),
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

const fn validate_timeout_ms(
    section: &'static str,
    field: &'static str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigSchemaError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigSchemaError::TimeoutOutOfRange {
            section,
            field,
            value_ms,
            min_ms,
            max_ms,
        });
    }
    Ok(())
}

fn validate_http_url(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigSchemaError> {
    let parsed = Url::parse(value).map_err(|_| ConfigSchemaError::InvalidUrl {
        section,
        field,
        url: value.to_owned(),
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigSchemaError::InvalidUrl {
            section,
            field,
            url: value.to_owned(),
        });
    }

    Ok(())
}

fn validate_limit_u32(
    section: &'static str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), ConfigSchemaError> {
    if value < min || value > max {
        return Err(ConfigSchemaError::LimitOutOfRange {
            section,
            field,
            value: u64::from(value),
            min: u64::from(min),
            max: u64::from(max),
        });
    }
    Ok(())
}

fn normalize_optional_trimmed(value: &mut Option<Box<str>>) {
    let Some(raw) = value.take() else {
        return;
    };
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        *value = Some(trimmed.to_owned().into_boxed_str());
    }
}

fn normalize_optional_secret(value: &mut Option<SecretString>) {
    let Some(raw) = value.take() else {
        return;
    };
    if !raw.is_blank() {
        *value = Some(SecretString::new(raw.expose().trim()));
    }
}

fn normalize_boxed_str(value: &mut Box<str>) {
    let trimmed = value.trim();
    if trimmed == value.as_ref() {
        return;
    }
    *value = trimmed.to_owned().into_boxed_str();
}
