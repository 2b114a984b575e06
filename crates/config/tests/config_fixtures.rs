//! Integration tests for parsing config fixtures.

use hybrid_rag_config::{
    DistanceSetting, EmbeddingProviderKind, LogFormat, LogLevelSetting, RuntimeEnv,
    TransportKind, VectorStoreProvider, load_runtime_config_from_path, parse_runtime_config_json,
    parse_runtime_config_toml,
};
use hybrid_rag_shared::ErrorCode;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

fn read_fixture(relative: &str) -> Result<String, Box<dyn Error>> {
    Ok(fs::read_to_string(fixture_path(relative))?)
}

#[test]
fn parses_valid_fixture_and_normalizes() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/runtime.valid.json")?;
    let config = parse_runtime_config_json(&contents)?;

    assert_eq!(config.server.host.as_ref(), "0.0.0.0");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.server.log_level, LogLevelSetting::Debug);
    assert_eq!(config.server.log_format, LogFormat::Json);
    assert_eq!(config.server.transport, TransportKind::Http);

    assert_eq!(config.vector_store.url.as_ref(), "http://qdrant:6333");
    assert_eq!(config.collection_name()?.as_str(), "knowledge_base");
    assert_eq!(config.vector_store.distance, DistanceSetting::Cosine);
    assert!(!config.vector_store.ensure_collection);

    assert_eq!(config.embedding.api_key, None);
    assert!(config.classifier.enabled);
    assert_eq!(config.classifier_base_url(), config.embedding.base_url.as_ref());

    let weights = config.fusion_weights()?;
    assert!((weights.vector() - 0.6).abs() < f32::EPSILON);
    assert!((weights.lexical() - 0.4).abs() < f32::EPSILON);
    assert_eq!(config.search.candidate_pool_factor, 3);
    Ok(())
}

#[test]
fn parses_memory_toml_fixture() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/runtime.memory.toml")?;
    let config = parse_runtime_config_toml(&contents)?;

    assert_eq!(config.vector_store.provider, VectorStoreProvider::Memory);
    assert_eq!(
        config.vector_store.seed_path.as_deref(),
        Some(Path::new("corpus.json"))
    );
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Test);
    assert_eq!(config.embedding.dimension, Some(64));
    assert_eq!(config.search.score_threshold, Some(0.0));
    Ok(())
}

#[test]
fn invalid_fixture_reports_error_code() -> Result<(), Box<dyn Error>> {
    let contents = read_fixture("config/runtime.invalid.json")?;
    let error = parse_runtime_config_json(&contents).err();

    let Some(error) = error else {
        return Err("expected invalid config to fail".into());
    };
    assert_eq!(error.code, ErrorCode::new("config", "invalid_limit"));
    assert_eq!(
        error.metadata.get("field").map(String::as_str),
        Some("defaultLimit")
    );
    Ok(())
}

#[test]
fn loads_from_path_with_format_detection() -> Result<(), Box<dyn Error>> {
    let env = RuntimeEnv::default();

    let toml = load_runtime_config_from_path(
        Some(&fixture_path("config/runtime.memory.toml")),
        None,
        &env,
    )?;
    assert_eq!(toml.vector_store.provider, VectorStoreProvider::Memory);

    let json = load_runtime_config_from_path(
        Some(&fixture_path("config/runtime.valid.json")),
        Some(r#"{ "server": { "transport": "stdio" } }"#),
        &env,
    )?;
    assert_eq!(json.server.transport, TransportKind::Stdio);
    assert_eq!(json.server.port, 8090);
    Ok(())
}

#[test]
fn missing_config_file_is_reported() {
    let error = load_runtime_config_from_path(
        Some(&fixture_path("config/does-not-exist.json")),
        None,
        &RuntimeEnv::default(),
    )
    .err();

    assert!(matches!(
        error,
        Some(ref e) if e.code == ErrorCode::new("config", "config_file_not_found")
    ));
}
