//! Tests for layered configuration loading.

use super::*;
use crate::{EmbedderProvider, MemoryStoreKind};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Verify that a minimal config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = MnemosConfig::load_from_str("{}").expect("config");
    assert_eq!(config.model.name, "gpt-4o");
    assert_eq!(config.memory.store, MemoryStoreKind::Memory);
    assert_eq!(config.memory.embedder.provider, EmbedderProvider::Hashing);
    assert_eq!(config.memory.recall_query_token_budget, 2048);
    assert_eq!(config.engine.call_timeout_secs, 120);
}

#[test]
fn parses_json5_with_comments() {
    let json5 = r#"{
        // local persistent store
        memory: { store: "jsonl", path: "/tmp/mnemos.jsonl", recall_k: 3 },
        tools: { policy: { deny: ["web_search"] } },
    }"#;
    let config = MnemosConfig::load_from_str(json5).expect("config");
    assert_eq!(config.memory.store, MemoryStoreKind::Jsonl);
    assert_eq!(config.memory.recall_k, 3);
    assert!(!config.tools.policy.permits("web_search"));
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = MnemosConfig::load_from_str("{ unexpected: true }").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
    assert!(msg.contains("config:unexpected"));
}

#[test]
fn rejects_wrong_value_type() {
    let err = MnemosConfig::load_from_str(r#"{ engine: { max_iterations: "ten" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("engine.max_iterations"));
}

#[test]
fn rejects_unknown_store_kind() {
    let err = MnemosConfig::load_from_str(r#"{ memory: { store: "redis" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("memory.store"));
    assert!(msg.contains("expected one of: memory, jsonl"));
}

#[test]
fn rejects_zero_recall_k_after_decode() {
    let err = MnemosConfig::load_from_str("{ memory: { recall_k: 0 } }").unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid config at memory.recall_k: must be a positive integer"
    );
}

/// Ensure higher precedence layers override lower ones while keeping siblings.
#[test]
fn layered_config_merges_in_precedence_order() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("user.json5");
    write_json5(
        &user_config,
        r#"{ model: { name: "user-model" }, engine: { max_iterations: 4 } }"#,
    );
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ model: { name: "project-model" }, memory: { recall_k: 7 } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ model: { name: "cwd-model" } }"#,
    );
    let runtime = root.join("runtime.json5");
    write_json5(&runtime, "{ engine: { call_timeout_secs: 5 } }");

    let options = LayeredConfigOptions::new(&cwd)
        .with_user_path(Some(user_config))
        .with_runtime_path(&runtime);
    let layered = MnemosConfig::load_layered_with_options(options).expect("layered");

    assert_eq!(layered.config.model.name, "cwd-model");
    assert_eq!(layered.config.memory.recall_k, 7);
    assert_eq!(layered.config.engine.max_iterations, 4);
    assert_eq!(layered.config.engine.call_timeout_secs, 5);
    let sources: Vec<ConfigLayerSource> =
        layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Runtime,
        ]
    );
}

/// The project and cwd layers collapse when cwd is the project root.
#[test]
fn layered_config_skips_duplicate_paths() {
    let temp = TempDir::new().expect("tmp");
    let project_root = temp.path().join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ memory: { recall_k: 2 } }",
    );

    let options = LayeredConfigOptions::new(&project_root).with_user_path(None);
    let layered = MnemosConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Project);
    assert_eq!(layered.config.memory.recall_k, 2);
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = LayeredConfigOptions::new(temp.path())
        .with_user_path(None)
        .with_runtime_path(temp.path().join("missing.json5"));
    let err = MnemosConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed { .. }));
    assert!(err.to_string().contains("missing.json5"));
}

#[test]
fn invalid_layer_reports_its_origin() {
    let temp = TempDir::new().expect("tmp");
    let user = temp.path().join("user.json5");
    write_json5(&user, "{ tools: { policy: { allow: [1] } } }");
    let options = LayeredConfigOptions::new(temp.path()).with_user_path(Some(user));
    let err = MnemosConfig::load_layered_with_options(options).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("user("));
    assert!(msg.contains("tools.policy.allow[0]"));
}
