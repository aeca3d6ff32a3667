//! Tests for layered configuration loading.

use super::*;
use crate::OrchestratorConfig;
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

#[test]
fn parse_minimal_config() {
    let config = VitalisConfig::load_from_str("{}").expect("config");
    assert_eq!(config.model.id, "anthropic/claude-3-5-sonnet-20240620");
    assert_eq!(config.memory.collection, "memories");
    assert_eq!(config.memory.targeted_limit, 3);
    assert_eq!(config.memory.general_limit, 5);
    assert_eq!(config.memory.evaluation_window, 3);
    assert_eq!(config.orchestrator.step_limit, 10);
    assert_eq!(config.server.bind, "0.0.0.0:8000");
    assert!(config.memory.write.detect_secrets);
}

#[test]
fn parse_json5_with_comments_and_overrides() {
    let json5 = r#"{
        // switch providers
        model: { id: "openai/gpt-4o-mini", api_key_env: "MY_KEY" },
        memory: { targeted_limit: 4, write: { redact_patterns: ["\\d{4}"] } },
    }"#;
    let config = VitalisConfig::load_from_str(json5).expect("config");
    assert_eq!(config.model.id, "openai/gpt-4o-mini");
    assert_eq!(config.model.api_key_env.as_deref(), Some("MY_KEY"));
    assert_eq!(config.memory.targeted_limit, 4);
    assert_eq!(config.memory.general_limit, 5);
    assert_eq!(config.memory.write.redact_patterns, vec!["\\d{4}".to_string()]);
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = VitalisConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_unknown_nested_key() {
    let err = VitalisConfig::load_from_str(r#"{ memory: { recall_k: 4 } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("memory.recall_k"));
    assert!(msg.contains("unknown key"));
}

#[test]
fn rejects_wrong_value_type() {
    let err = VitalisConfig::load_from_str(r#"{ orchestrator: { step_limit: "ten" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("orchestrator.step_limit"));
}

#[test]
fn rejects_model_without_provider() {
    let err = VitalisConfig::load_from_str(r#"{ model: { id: "gpt-4o" } }"#).unwrap_err();
    assert!(format!("{err}").contains("model.id"));
}

#[test]
fn rejects_zero_limits() {
    let err = VitalisConfig::load_from_str(r#"{ memory: { general_limit: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("memory.general_limit"));
}

#[test]
fn rejects_uncompilable_redact_pattern() {
    let err = VitalisConfig::load_from_str(r#"{ memory: { write: { redact_patterns: ["("] } } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("redact_patterns[0]"));
}

#[test]
fn builder_overrides_defaults() {
    let config = VitalisConfig::builder()
        .model_id("openai/gpt-4o")
        .orchestrator(OrchestratorConfig { step_limit: 4 })
        .build();
    assert_eq!(config.model.id, "openai/gpt-4o");
    assert_eq!(config.orchestrator.step_limit, 4);
    config.validate().expect("valid");
}

#[test]
fn layered_config_applies_precedence() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");

    let user_config = root.join("user.json5");
    write_json5(
        &user_config,
        r#"{ memory: { collection: "user" }, server: { bind: "127.0.0.1:9000" } }"#,
    );
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { collection: "project", general_limit: 7 } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { collection: "cwd" } }"#,
    );
    write_json5(
        &project_root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        r#"{ memory: { collection: "repo" } }"#,
    );

    let mut options = LayeredConfigOptions::new(&cwd);
    options.user_config_path = Some(user_config);
    let layered = VitalisConfig::load_layered_with_options(options).expect("layered");

    assert_eq!(layered.config.memory.collection, "repo");
    assert_eq!(layered.config.memory.general_limit, 7);
    assert_eq!(layered.config.server.bind, "127.0.0.1:9000");
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Repo,
        ]
    );
}

#[test]
fn runtime_layer_wins_and_must_exist() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path().join("work");
    fs::create_dir_all(&cwd).expect("cwd");
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ orchestrator: { step_limit: 6 } }"#,
    );
    let runtime = temp.path().join("override.json5");
    write_json5(&runtime, r#"{ orchestrator: { step_limit: 12 } }"#);

    let mut options = LayeredConfigOptions::new(&cwd).with_runtime_path(&runtime);
    options.user_config_path = None;
    let layered = VitalisConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.orchestrator.step_limit, 12);

    let mut missing = LayeredConfigOptions::new(&cwd).with_runtime_path(temp.path().join("nope.json5"));
    missing.user_config_path = None;
    let err = VitalisConfig::load_layered_with_options(missing).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn invalid_layer_reports_its_label() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path().to_path_buf();
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), r#"{ server: { port: 1 } }"#);
    let mut options = LayeredConfigOptions::new(&cwd);
    options.user_config_path = None;
    let err = VitalisConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("server.port"));
}

#[test]
fn malformed_layer_names_the_file() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path().join("work");
    fs::create_dir_all(&cwd).expect("cwd");
    let runtime = temp.path().join("broken.json5");
    write_json5(&runtime, "{ memory: ");

    let mut options = LayeredConfigOptions::new(&cwd).with_runtime_path(&runtime);
    options.user_config_path = None;
    let err = VitalisConfig::load_layered_with_options(options).unwrap_err();
    match err {
        ConfigError::Parse { label, .. } => {
            assert!(label.starts_with("runtime("));
            assert!(label.contains("broken.json5"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
